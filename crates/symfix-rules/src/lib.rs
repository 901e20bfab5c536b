//! symfix-rules: Symfony upgrade rules
//!
//! Available rules:
//! - status_code_setter: `$response->setStatusCode(404)` to `Response::HTTP_NOT_FOUND`
//! - status_code_assertion: status codes in test assertions
//! - status_code_redirect: status codes in `redirect()` / `redirectToRoute()`
//! - status_code_constructor: status codes in `new Response(..., 200)` and subclasses
//! - status_code_comparison: literals compared with `getStatusCode()`
//! - rename_method: configurable method renames on typed receivers
//! - add_return_type: return types required by parent signatures
//! - logout_handler_to_subscriber: `LogoutHandlerInterface` to a `LogoutEvent` subscriber
//! - logout_success_handler_to_subscriber: `LogoutSuccessHandlerInterface` to a
//!   `LogoutEvent` subscriber

pub mod add_return_type;
pub mod logout_handler;
pub mod registry;
pub mod rename_method;
pub mod resolver;
pub mod rule_set;
pub mod status_code_assertion;
pub mod status_code_comparison;
pub mod status_code_constructor;
pub mod status_code_redirect;
pub mod status_code_setter;
pub mod status_codes;

pub use add_return_type::AddReturnTypeRule;
pub use logout_handler::{LogoutHandlerToSubscriberRule, LogoutSuccessHandlerToSubscriberRule};
pub use registry::RuleRegistry;
pub use rename_method::RenameMethodRule;
pub use resolver::{ClassNameControllerContext, LocalTypeResolver};
pub use rule_set::{MethodRename, ReturnTypeEntry, RuleSet, RuleSetError};
pub use status_code_assertion::StatusCodeAssertionRule;
pub use status_code_comparison::StatusCodeComparisonRule;
pub use status_code_constructor::StatusCodeConstructorRule;
pub use status_code_redirect::StatusCodeRedirectRule;
pub use status_code_setter::StatusCodeSetterRule;
pub use status_codes::StatusCodeTable;
