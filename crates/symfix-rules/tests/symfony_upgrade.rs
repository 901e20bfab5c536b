//! Built-in rules run together through the engine, as the CLI runs them

use std::collections::HashSet;
use std::fs;

use symfix_core::{Engine, EngineConfig};
use symfix_rules::{ClassNameControllerContext, LocalTypeResolver, RuleRegistry, RuleSet};
use tempfile::TempDir;

fn upgrade_with(registry: &RuleRegistry, source: &str) -> (String, Vec<String>) {
    let resolver = LocalTypeResolver::new();
    let controllers = ClassNameControllerContext;
    let output = Engine::new(registry.all())
        .with_resolver(&resolver)
        .with_controllers(&controllers)
        .rewrite(source)
        .unwrap();
    let rules = output.changes.into_iter().map(|change| change.rule).collect();
    (output.text, rules)
}

fn upgrade(source: &str) -> String {
    upgrade_with(&RuleRegistry::new(), source).0
}

const CONTROLLER: &str = r#"<?php

namespace App\Controller;

use Symfony\Bundle\FrameworkBundle\Controller\AbstractController;
use Symfony\Component\HttpFoundation\JsonResponse;
use Symfony\Component\HttpFoundation\Response;

class ArticleController extends AbstractController
{
    public function show(Response $response, $found)
    {
        if (!$found) {
            $response->setStatusCode(404);

            return $response;
        }

        return $this->redirectToRoute('article_list', [], 301);
    }

    public function api()
    {
        $response = new JsonResponse(['ok' => true], 201);
        if ($response->getStatusCode() === 201) {
            return $response;
        }

        return new Response('', 500);
    }
}
"#;

#[test]
fn test_controller_upgrade() {
    let (text, rules) = upgrade_with(&RuleRegistry::new(), CONTROLLER);

    assert!(text.contains("$response->setStatusCode(Response::HTTP_NOT_FOUND);"));
    assert!(text.contains(
        "return $this->redirectToRoute('article_list', [], Response::HTTP_MOVED_PERMANENTLY);"
    ));
    assert!(text.contains("new JsonResponse(['ok' => true], Response::HTTP_CREATED);"));
    assert!(text.contains("if ($response->getStatusCode() === Response::HTTP_CREATED) {"));
    assert!(text.contains("return new Response('', Response::HTTP_INTERNAL_SERVER_ERROR);"));

    let applied: HashSet<String> = rules.into_iter().collect();
    for rule in [
        "status_code_setter",
        "status_code_redirect",
        "status_code_constructor",
        "status_code_comparison",
    ] {
        assert!(applied.contains(rule), "{} did not apply", rule);
    }
}

#[test]
fn test_untouched_text_is_preserved() {
    let text = upgrade(CONTROLLER);
    assert!(text.starts_with("<?php\n\nnamespace App\\Controller;\n\nuse Symfony\\Bundle"));
    assert!(text.contains("        if (!$found) {\n"));
    assert!(text.contains("\n\n            return $response;\n        }\n\n        return $this"));
    assert!(text.ends_with("    }\n}\n"));
}

#[test]
fn test_upgrade_is_idempotent() {
    let once = upgrade(CONTROLLER);
    let (twice, rules) = upgrade_with(&RuleRegistry::new(), &once);
    assert_eq!(twice, once);
    assert!(rules.is_empty());
}

#[test]
fn test_functional_test_assertions() {
    let source = r#"<?php

class ArticleControllerTest extends WebTestCase
{
    public function testShow(): void
    {
        $client = static::createClient();
        $client->request('GET', '/article/1');

        $this->assertResponseStatusCodeSame(200);
        $this->assertSame(404, $client->getResponse()->getStatusCode());
    }
}
"#;
    let text = upgrade(source);
    assert!(text.contains(
        "$this->assertResponseStatusCodeSame(\\Symfony\\Component\\HttpFoundation\\Response::HTTP_OK);"
    ));
    assert!(text.contains(
        "$this->assertSame(\\Symfony\\Component\\HttpFoundation\\Response::HTTP_NOT_FOUND, $client->getResponse()->getStatusCode());"
    ));
    assert_eq!(upgrade(&text), text);
}

#[test]
fn test_command_and_logout_handler_in_one_file() {
    let source = r#"<?php

class PurgeCommand extends Command
{
    protected function execute(InputInterface $input, OutputInterface $output)
    {
        return 0;
    }
}

class SessionCleaner implements LogoutHandlerInterface
{
    public function logout(Request $request, Response $response, TokenInterface $token)
    {
        $request->getSession()->clear();
    }
}
"#;
    let (text, rules) = upgrade_with(&RuleRegistry::new(), source);

    assert!(text.contains(
        "protected function execute(InputInterface $input, OutputInterface $output): int"
    ));
    assert!(text.contains(
        "class SessionCleaner implements \\Symfony\\Component\\EventDispatcher\\EventSubscriberInterface"
    ));
    assert!(text.contains("        $request = $logoutEvent->getRequest();\n"));
    assert!(!text.contains("LogoutHandlerInterface"));
    assert_eq!(rules, vec!["add_return_type", "logout_handler_to_subscriber"]);
}

#[test]
fn test_enabled_subset_only() {
    let registry = RuleRegistry::new();
    let enabled: HashSet<String> = ["status_code_constructor".to_string()].into_iter().collect();
    let resolver = LocalTypeResolver::new();
    let controllers = ClassNameControllerContext;
    let output = Engine::new(registry.get_enabled(&enabled))
        .with_resolver(&resolver)
        .with_controllers(&controllers)
        .rewrite(CONTROLLER)
        .unwrap();

    assert!(output.text.contains("$response->setStatusCode(404);"));
    assert!(output
        .text
        .contains("Response::HTTP_CREATED);\n        if ($response->getStatusCode() === 201)"));
    assert!(output.changes.iter().all(|c| c.rule == "status_code_constructor"));
    assert_eq!(output.changes.len(), 2);
}

#[test]
fn test_rule_set_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("symfony.yaml");
    fs::write(
        &path,
        r#"
status_code_class: HttpStatus
status_codes:
  299: HTTP_ALMOST_OK
method_renames:
  - type: Symfony\Component\HttpFoundation\Request
    old: getSession
    new: getSessionOrFail
return_types: []
"#,
    )
    .unwrap();

    let rule_set = RuleSet::from_file(&path).unwrap();
    let registry = RuleRegistry::from_rule_set(&rule_set);
    let resolver = LocalTypeResolver::new().with_parent("HttpStatus", "Response");
    let source = r#"<?php
use Symfony\Component\HttpFoundation\Request;

class SessionCommand extends Command
{
    protected function execute(Request $request, HttpStatus $status)
    {
        $request->getSession()->clear();
        $status->setStatusCode(299);
        $status->setStatusCode(404);
    }
}
"#;
    let output = Engine::new(registry.all())
        .with_resolver(&resolver)
        .rewrite(source)
        .unwrap();

    assert!(output.text.contains("$request->getSessionOrFail()->clear();"));
    assert!(output.text.contains("$status->setStatusCode(HttpStatus::HTTP_ALMOST_OK);"));
    assert!(output.text.contains("$status->setStatusCode(HttpStatus::HTTP_NOT_FOUND);"));
    assert!(output
        .text
        .contains("protected function execute(Request $request, HttpStatus $status)\n"));
}

#[test]
fn test_invalid_rule_set_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.yaml");
    fs::write(&path, "status_codes: [not, a, map]\n").unwrap();
    assert!(RuleSet::from_file(&path).is_err());
    assert!(RuleSet::from_file(&dir.path().join("missing.yaml")).is_err());
}

#[test]
fn test_engine_config_budget_is_respected() {
    let registry = RuleRegistry::new();
    let config = EngineConfig {
        visit_budget: 1,
        ..EngineConfig::default()
    };
    let resolver = LocalTypeResolver::new();
    let output = Engine::new(registry.all())
        .with_resolver(&resolver)
        .with_config(config)
        .rewrite("<?php\nfunction f(Response $r) { $r->setStatusCode(200); }\n")
        .unwrap();
    assert_eq!(
        output.text,
        "<?php\nfunction f(Response $r) { $r->setStatusCode(\\Symfony\\Component\\HttpFoundation\\Response::HTTP_OK); }\n"
    );
}
