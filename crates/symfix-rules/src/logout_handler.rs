//! Rules: logout_handler_to_subscriber, logout_success_handler_to_subscriber
//!
//! Symfony 5.1 replaced `LogoutHandlerInterface` and
//! `LogoutSuccessHandlerInterface` with a `LogoutEvent`. These rules turn a
//! handler class into an event subscriber listening to that event.
//!
//! Example:
//! ```php
//! // Before
//! class LogoutListener implements LogoutHandlerInterface
//! {
//!     public function logout(Request $request, Response $response, TokenInterface $token)
//!     {
//!         $this->tracker->forget($token->getUser());
//!     }
//! }
//!
//! // After
//! class LogoutListener implements \Symfony\Component\EventDispatcher\EventSubscriberInterface
//! {
//!     public static function getSubscribedEvents(): array
//!     {
//!         return [\Symfony\Component\Security\Http\Event\LogoutEvent::class => 'onLogout'];
//!     }
//!
//!     public function onLogout(\Symfony\Component\Security\Http\Event\LogoutEvent $logoutEvent): void
//!     {
//!         $token = $logoutEvent->getToken();
//!         $this->tracker->forget($token->getUser());
//!     }
//! }
//! ```
//!
//! Only the handler parameters the body actually reads are fetched from the
//! event. For success handlers, `return $response;` becomes
//! `$logoutEvent->setResponse($response);` followed by `return;` unless it
//! is the last statement of the method.

use symfix_core::node::Modifier;
use symfix_core::query::{class_name_of, identifier_text, implements_matches, short_name};
use symfix_core::{
    FragmentBuilder, Node, NodeId, NodeKind, Replacement, Rule, RuleContext, RuleFailure,
    SyntaxTree,
};
use tracing::debug;

const EVENT_SUBSCRIBER_INTERFACE: &str =
    "\\Symfony\\Component\\EventDispatcher\\EventSubscriberInterface";
const LOGOUT_EVENT: &str = "\\Symfony\\Component\\Security\\Http\\Event\\LogoutEvent";
const EVENT_VARIABLE: &str = "logoutEvent";
const LISTENER_METHOD: &str = "onLogout";
const SUBSCRIBED_EVENTS_METHOD: &str = "getSubscribedEvents";

/// What differs between the two handler interfaces
struct HandlerShape {
    interface: &'static str,
    method: &'static str,
    /// `LogoutEvent` getter for each handler parameter, by position
    getters: &'static [&'static str],
    /// The handler returns a response that must go to the event
    forwards_returns: bool,
}

const LOGOUT_HANDLER: HandlerShape = HandlerShape {
    interface: "LogoutHandlerInterface",
    method: "logout",
    getters: &["getRequest", "getResponse", "getToken"],
    forwards_returns: false,
};

const LOGOUT_SUCCESS_HANDLER: HandlerShape = HandlerShape {
    interface: "LogoutSuccessHandlerInterface",
    method: "onLogoutSuccess",
    getters: &["getRequest"],
    forwards_returns: true,
};

pub struct LogoutHandlerToSubscriberRule;

impl Rule for LogoutHandlerToSubscriberRule {
    fn name(&self) -> &'static str {
        "logout_handler_to_subscriber"
    }

    fn description(&self) -> &'static str {
        "Convert LogoutHandlerInterface implementations to LogoutEvent subscribers"
    }

    fn interested_kinds(&self) -> &[NodeKind] {
        &[NodeKind::ClassDecl]
    }

    fn apply(&self, ctx: &RuleContext<'_>, node: NodeId) -> Result<Option<Replacement>, RuleFailure> {
        convert_handler(ctx, node, &LOGOUT_HANDLER)
    }
}

pub struct LogoutSuccessHandlerToSubscriberRule;

impl Rule for LogoutSuccessHandlerToSubscriberRule {
    fn name(&self) -> &'static str {
        "logout_success_handler_to_subscriber"
    }

    fn description(&self) -> &'static str {
        "Convert LogoutSuccessHandlerInterface implementations to LogoutEvent subscribers"
    }

    fn interested_kinds(&self) -> &[NodeKind] {
        &[NodeKind::ClassDecl]
    }

    fn apply(&self, ctx: &RuleContext<'_>, node: NodeId) -> Result<Option<Replacement>, RuleFailure> {
        convert_handler(ctx, node, &LOGOUT_SUCCESS_HANDLER)
    }
}

fn convert_handler(
    ctx: &RuleContext<'_>,
    node: NodeId,
    shape: &HandlerShape,
) -> Result<Option<Replacement>, RuleFailure> {
    let tree = ctx.tree;
    if !implements_matches(tree, node, shape.interface) {
        return Ok(None);
    }
    let Node::ClassDecl {
        modifiers,
        name,
        extends,
        implements,
        members,
    } = tree.node(node)
    else {
        return Ok(None);
    };

    let Some(handler) = members
        .iter()
        .copied()
        .find(|member| is_method_named(tree, *member, shape.method))
    else {
        return Ok(None);
    };
    let Node::MethodDecl {
        params,
        body: Some(body),
        ..
    } = tree.node(handler)
    else {
        return Ok(None);
    };
    let Node::Block { statements } = tree.node(*body) else {
        return Ok(None);
    };
    // A hand-written listener already sits next to the handler
    let clashes = members.iter().any(|member| {
        *member != handler
            && (is_method_named(tree, *member, LISTENER_METHOD)
                || is_method_named(tree, *member, SUBSCRIBED_EVENTS_METHOD))
    });
    if clashes {
        debug!(handler = shape.interface, "listener method already present, skipping");
        return Ok(None);
    }

    let mut builder = FragmentBuilder::new();
    let class_name = builder.copy_of(tree, *name);
    let extends = extends.map(|parent| builder.copy_of(tree, parent));

    let already_subscriber = implements.iter().any(|interface| {
        identifier_text(tree, *interface)
            .is_some_and(|text| short_name(text) == short_name(EVENT_SUBSCRIBER_INTERFACE))
    });
    let mut interfaces = Vec::with_capacity(implements.len());
    for interface in implements {
        let is_handler = identifier_text(tree, *interface)
            .is_some_and(|text| short_name(text) == shape.interface);
        if !is_handler {
            interfaces.push(builder.copy_of(tree, *interface));
        } else if !already_subscriber {
            interfaces.push(builder.name(EVENT_SUBSCRIBER_INTERFACE));
        }
    }

    let mut new_members = vec![subscribed_events_method(&mut builder)];
    for member in members {
        if *member == handler {
            let listener = listener_method(&mut builder, tree, params, *body, statements, shape);
            builder.carry_comments(listener, tree, handler);
            new_members.push(listener);
        } else {
            new_members.push(builder.copy_of(tree, *member));
        }
    }

    let class = builder.push(Node::ClassDecl {
        modifiers: modifiers.clone(),
        name: class_name,
        extends,
        implements: interfaces,
        members: new_members,
    });
    let message = format!(
        "Convert {} from {} to a LogoutEvent subscriber",
        identifier_text(tree, *name).unwrap_or_default(),
        shape.interface
    );
    Ok(Some(Replacement::replace(node, builder.finish(class)?).with_message(message)))
}

fn is_method_named(tree: &SyntaxTree, member: NodeId, method: &str) -> bool {
    tree.kind(member) == NodeKind::MethodDecl
        && class_name_of(tree, member).is_some_and(|name| name.eq_ignore_ascii_case(method))
}

/// `public static function getSubscribedEvents(): array`
fn subscribed_events_method(builder: &mut FragmentBuilder) -> NodeId {
    let event_class = builder.class_const_fetch(LOGOUT_EVENT, "class");
    let listener = builder.string(LISTENER_METHOD);
    let item = builder.array_item(Some(event_class), listener);
    let events = builder.array(vec![item]);
    let statement = builder.return_statement(Some(events));
    let body = builder.block(vec![statement]);
    let name = builder.identifier(SUBSCRIBED_EVENTS_METHOD);
    let return_type = builder.simple_type("array");
    builder.push(Node::MethodDecl {
        modifiers: vec![Modifier::Public, Modifier::Static],
        by_ref: false,
        name,
        params: Vec::new(),
        return_type: Some(return_type),
        body: Some(body),
    })
}

/// `public function onLogout(LogoutEvent $logoutEvent): void` carrying the
/// handler's body
fn listener_method(
    builder: &mut FragmentBuilder,
    tree: &SyntaxTree,
    params: &[NodeId],
    body: NodeId,
    statements: &[NodeId],
    shape: &HandlerShape,
) -> NodeId {
    let mut new_statements = Vec::new();
    for (param, getter) in params.iter().zip(shape.getters) {
        let Node::Parameter { var, .. } = tree.node(*param) else {
            continue;
        };
        let Some(variable) = identifier_text(tree, *var) else {
            continue;
        };
        if !reads_variable(tree, body, variable) {
            continue;
        }
        let event = builder.variable(EVENT_VARIABLE);
        let call = builder.method_call(event, getter, Vec::new());
        let target = builder.variable(variable);
        let assign = builder.assign(target, call);
        new_statements.push(builder.expression_statement(assign));
    }

    if shape.forwards_returns {
        let last = statements.last().copied();
        for statement in statements {
            let roots = builder.copy_with(tree, *statement, &mut |builder, id| {
                forward_return(builder, tree, id, last)
            });
            new_statements.extend(roots);
        }
    } else {
        for statement in statements {
            new_statements.push(builder.copy_of(tree, *statement));
        }
    }

    let event_type = builder.simple_type(LOGOUT_EVENT);
    let event_variable = builder.variable(EVENT_VARIABLE);
    let param = builder.push(Node::Parameter {
        modifiers: Vec::new(),
        type_hint: Some(event_type),
        by_ref: false,
        variadic: false,
        var: event_variable,
        default: None,
    });
    let name = builder.identifier(LISTENER_METHOD);
    let return_type = builder.simple_type("void");
    let body = builder.block(new_statements);
    builder.push(Node::MethodDecl {
        modifiers: vec![Modifier::Public],
        by_ref: false,
        name,
        params: vec![param],
        return_type: Some(return_type),
        body: Some(body),
    })
}

fn reads_variable(tree: &SyntaxTree, body: NodeId, variable: &str) -> bool {
    tree.descendants(body)
        .into_iter()
        .any(|id| matches!(tree.node(id), Node::Variable { name } if name == variable))
}

/// `return $x;` -> `$logoutEvent->setResponse($x); return;`
fn forward_return(
    builder: &mut FragmentBuilder,
    tree: &SyntaxTree,
    id: NodeId,
    last: Option<NodeId>,
) -> Option<Vec<NodeId>> {
    match tree.node(id) {
        // their returns belong to another function
        Node::Closure { .. } | Node::ArrowFunction { .. } | Node::FunctionDecl { .. } => {
            Some(vec![builder.copy_of(tree, id)])
        }
        Node::Return { value: Some(value) } => {
            let value = builder.copy_of(tree, *value);
            let argument = builder.argument(value);
            let event = builder.variable(EVENT_VARIABLE);
            let call = builder.method_call(event, "setResponse", vec![argument]);
            let set_response = builder.expression_statement(call);
            if Some(id) == last {
                return Some(vec![set_response]);
            }
            let bare_return = builder.return_statement(None);
            let in_list = tree.parent(id).is_some_and(|parent| {
                matches!(tree.kind(parent), NodeKind::Block | NodeKind::Case | NodeKind::File)
            });
            if in_list {
                Some(vec![set_response, bare_return])
            } else {
                Some(vec![builder.block(vec![set_response, bare_return])])
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use symfix_core::Engine;

    fn transform(rule: &dyn Rule, source: &str) -> String {
        Engine::new(vec![rule]).rewrite(source).unwrap().text
    }

    // ==================== Logout Handler ====================

    #[test]
    fn test_logout_handler() {
        let source = r#"<?php

class LogoutListener implements LogoutHandlerInterface
{
    private $tracker;

    public function logout(Request $request, Response $response, TokenInterface $token)
    {
        // forget the user
        $this->tracker->forget($token->getUser());
    }
}
"#;
        let expected = r#"<?php

class LogoutListener implements \Symfony\Component\EventDispatcher\EventSubscriberInterface
{
    public static function getSubscribedEvents(): array
    {
        return [\Symfony\Component\Security\Http\Event\LogoutEvent::class => 'onLogout'];
    }

    private $tracker;

    public function onLogout(\Symfony\Component\Security\Http\Event\LogoutEvent $logoutEvent): void
    {
        $token = $logoutEvent->getToken();
        // forget the user
        $this->tracker->forget($token->getUser());
    }
}
"#;
        assert_eq!(transform(&LogoutHandlerToSubscriberRule, source), expected);
    }

    #[test]
    fn test_handler_doc_comment_moves_to_listener() {
        let source = r#"<?php

class LogoutListener implements LogoutHandlerInterface
{
    /**
     * Forget the user on logout
     */
    public function logout(Request $request, Response $response, TokenInterface $token)
    {
        // clear
        $request->getSession()->clear();
    }
}
"#;
        let result = transform(&LogoutHandlerToSubscriberRule, source);
        assert!(result.contains(
            "    /**\n     * Forget the user on logout\n     */\n    public function onLogout(\\Symfony\\Component\\Security\\Http\\Event\\LogoutEvent $logoutEvent): void\n"
        ));
        assert!(result.contains("        // clear\n"));
        assert_eq!(result.matches("Forget the user on logout").count(), 1);
    }

    #[test]
    fn test_parameters_fetched_in_order_with_original_names() {
        let source = r#"<?php
final class Audit extends BaseAudit implements Countable, LogoutHandlerInterface
{
    public function logout(Request $req, Response $res, TokenInterface $tok)
    {
        $this->log($req->getClientIp(), $tok);
    }
}
"#;
        let result = transform(&LogoutHandlerToSubscriberRule, source);
        assert!(result.starts_with(
            "<?php\nfinal class Audit extends BaseAudit implements Countable, \\Symfony\\Component\\EventDispatcher\\EventSubscriberInterface\n{"
        ));
        assert!(result.contains(
            "        $req = $logoutEvent->getRequest();\n        $tok = $logoutEvent->getToken();\n        $this->log("
        ));
        assert!(!result.contains("getResponse()"));
    }

    #[test]
    fn test_existing_subscriber_interface_not_duplicated() {
        let source = r#"<?php
class Both implements EventSubscriberInterface, LogoutHandlerInterface
{
    public function logout(Request $request, Response $response, TokenInterface $token)
    {
    }
}
"#;
        let result = transform(&LogoutHandlerToSubscriberRule, source);
        assert!(result.contains("class Both implements EventSubscriberInterface\n{"));
        assert!(result.contains("$logoutEvent): void\n    {\n    }"));
    }

    #[test]
    fn test_skip_without_handler_method() {
        let source = "<?php\nclass Nope implements LogoutHandlerInterface\n{\n}\n";
        assert_eq!(transform(&LogoutHandlerToSubscriberRule, source), source);
    }

    #[test]
    fn test_skip_other_classes() {
        let source = "<?php\nclass Plain\n{\n    public function logout($a, $b, $c)\n    {\n    }\n}\n";
        assert_eq!(transform(&LogoutHandlerToSubscriberRule, source), source);
        assert_eq!(transform(&LogoutSuccessHandlerToSubscriberRule, source), source);
    }

    // ==================== Logout Success Handler ====================

    #[test]
    fn test_logout_success_handler() {
        let source = r#"<?php

class LogoutSuccess implements LogoutSuccessHandlerInterface
{
    public function onLogoutSuccess(Request $request)
    {
        if ($request->query->has('next')) {
            return new RedirectResponse($request->query->get('next'));
        }

        return new RedirectResponse('/');
    }
}
"#;
        let expected = r#"<?php

class LogoutSuccess implements \Symfony\Component\EventDispatcher\EventSubscriberInterface
{
    public static function getSubscribedEvents(): array
    {
        return [\Symfony\Component\Security\Http\Event\LogoutEvent::class => 'onLogout'];
    }

    public function onLogout(\Symfony\Component\Security\Http\Event\LogoutEvent $logoutEvent): void
    {
        $request = $logoutEvent->getRequest();
        if ($request->query->has('next')) {
            $logoutEvent->setResponse(new RedirectResponse($request->query->get('next')));
            return;
        }
        $logoutEvent->setResponse(new RedirectResponse('/'));
    }
}
"#;
        assert_eq!(transform(&LogoutSuccessHandlerToSubscriberRule, source), expected);
    }

    #[test]
    fn test_closure_returns_untouched() {
        let source = r#"<?php
class Redirecting implements LogoutSuccessHandlerInterface
{
    public function onLogoutSuccess(Request $request)
    {
        $url = $this->pick(function ($route) {
            return $this->router->generate($route);
        });
        return new RedirectResponse($url);
    }
}
"#;
        let result = transform(&LogoutSuccessHandlerToSubscriberRule, source);
        assert!(result.contains("            return $this->router->generate($route);"));
        assert!(result.contains("        $logoutEvent->setResponse(new RedirectResponse($url));\n    }"));
        assert!(!result.contains("$request = $logoutEvent->getRequest();"));
    }

    #[test]
    fn test_unbraced_return_gets_a_block() {
        let source = r#"<?php
class Early implements LogoutSuccessHandlerInterface
{
    public function onLogoutSuccess(Request $request)
    {
        if ($this->api) return new JsonResponse(null, 204);
        return new RedirectResponse('/');
    }
}
"#;
        let result = transform(&LogoutSuccessHandlerToSubscriberRule, source);
        assert!(result.contains(
            "if ($this->api) {\n            $logoutEvent->setResponse(new JsonResponse(null, 204));\n            return;\n        }"
        ));
    }
}
