//! Which frames belong in a rendered stack trace.
//!
//! The runtime hides some frames from `Exception.StackTrace` and async plumbing adds more that
//! carry no information for the reader. Both are filtered here by declaring type and method name.

use crate::{
    demystify::provider::{well_known, MetadataProvider},
    metadata::token::Token,
};

const TASK: &str = "System.Threading.Tasks.Task";
const TASK_OF_T: &str = "System.Threading.Tasks.Task`1";
const VALUE_TASK_OF_T: &str = "System.Threading.Tasks.ValueTask`1";
const EXECUTION_CONTEXT: &str = "System.Threading.ExecutionContext";
const EXCEPTION_DISPATCH_INFO: &str = "System.Runtime.ExceptionServices.ExceptionDispatchInfo";
const THROW_HELPER: &str = "System.ThrowHelper";

const AWAITERS: [&str; 8] = [
    "System.Runtime.CompilerServices.TaskAwaiter",
    "System.Runtime.CompilerServices.TaskAwaiter`1",
    "System.Runtime.CompilerServices.ValueTaskAwaiter",
    "System.Runtime.CompilerServices.ValueTaskAwaiter`1",
    "System.Runtime.CompilerServices.ConfiguredValueTaskAwaitable+ConfiguredValueTaskAwaiter",
    "System.Runtime.CompilerServices.ConfiguredValueTaskAwaitable`1+ConfiguredValueTaskAwaiter",
    "System.Runtime.CompilerServices.ConfiguredTaskAwaitable+ConfiguredTaskAwaiter",
    "System.Runtime.CompilerServices.ConfiguredTaskAwaitable`1+ConfiguredTaskAwaiter",
];

/// Known runtime methods that only schedule, unwrap or rethrow.
///
/// `declaring_type` is the reflection full name of the declaring type (`Ns.Outer+Inner`, with
/// arity suffixes).
///
/// # Examples
///
/// ```rust
/// use dotsym::demystify::is_runtime_plumbing;
///
/// assert!(is_runtime_plumbing("System.Runtime.CompilerServices.TaskAwaiter", "GetResult"));
/// assert!(!is_runtime_plumbing("System.Runtime.CompilerServices.TaskAwaiter", "OnCompleted"));
/// ```
#[must_use]
pub fn is_runtime_plumbing(declaring_type: &str, method: &str) -> bool {
    match declaring_type {
        TASK_OF_T => method == "InnerInvoke",
        VALUE_TASK_OF_T => method == "get_Result",
        TASK => matches!(
            method,
            "ExecuteWithThreadLocal"
                | "Execute"
                | "ExecutionContextCallback"
                | "ExecuteEntry"
                | "InnerInvoke"
        ),
        EXECUTION_CONTEXT => matches!(method, "RunInternal" | "Run"),
        EXCEPTION_DISPATCH_INFO => method == "Throw",
        THROW_HELPER => true,
        awaiter if AWAITERS.contains(&awaiter) => matches!(
            method,
            "HandleNonSuccessAndDebuggerNotification"
                | "ThrowForNonSuccess"
                | "ValidateEnd"
                | "GetResult"
        ),
        _ => false,
    }
}

/// Whether a method should appear in a rendered stack trace.
///
/// Hidden are methods marked `AggressiveInlining` (they only show up before tiered compilation
/// inlines them), methods or types marked `[StackTraceHidden]`, and the runtime plumbing listed
/// in [`is_runtime_plumbing`]. Methods the provider does not know are shown.
///
/// The outermost frame of a trace is always shown; callers apply that rule.
#[must_use]
pub fn show_in_stack_trace(provider: &dyn MetadataProvider, method: Token) -> bool {
    let Some(info) = provider.method(method) else {
        return true;
    };

    if info.is_aggressive_inlining() {
        return false;
    }

    if provider.has_attribute(method, well_known::STACK_TRACE_HIDDEN) {
        return false;
    }

    let Some(declaring_type) = info.declaring_type else {
        return true;
    };

    if provider.has_attribute(declaring_type, well_known::STACK_TRACE_HIDDEN) {
        return false;
    }

    match provider.type_name(declaring_type) {
        Some(name) => !is_runtime_plumbing(&name.full_name(), &info.name),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::FixtureProvider;

    #[test]
    fn plumbing() {
        assert!(is_runtime_plumbing(TASK, "ExecuteEntry"));
        assert!(!is_runtime_plumbing(TASK, "Wait"));
        assert!(is_runtime_plumbing(TASK_OF_T, "InnerInvoke"));
        assert!(!is_runtime_plumbing(TASK_OF_T, "Execute"));
        assert!(is_runtime_plumbing(VALUE_TASK_OF_T, "get_Result"));
        assert!(is_runtime_plumbing(EXECUTION_CONTEXT, "RunInternal"));
        assert!(is_runtime_plumbing(EXCEPTION_DISPATCH_INFO, "Throw"));
        assert!(is_runtime_plumbing(THROW_HELPER, "ThrowArgumentNullException"));
        assert!(is_runtime_plumbing(
            "System.Runtime.CompilerServices.ConfiguredTaskAwaitable`1+ConfiguredTaskAwaiter",
            "GetResult"
        ));
        assert!(!is_runtime_plumbing("App.Program", "GetResult"));
    }

    #[test]
    fn user_methods_are_shown() {
        let fixture = FixtureProvider::sample();
        assert!(show_in_stack_trace(&fixture, fixture.method_token("App.Program", "Main")));
    }

    #[test]
    fn hidden_methods() {
        let fixture = FixtureProvider::sample();
        assert!(!show_in_stack_trace(&fixture, fixture.method_token("App.Program", "Inlined")));
        assert!(!show_in_stack_trace(&fixture, fixture.method_token("App.Program", "Hidden")));
        assert!(!show_in_stack_trace(&fixture, fixture.method_token("App.HiddenType", "Run")));
        assert!(!show_in_stack_trace(
            &fixture,
            fixture.method_token("System.Runtime.CompilerServices.TaskAwaiter", "GetResult")
        ));
    }

    #[test]
    fn unknown_methods_are_shown() {
        let fixture = FixtureProvider::sample();
        assert!(show_in_stack_trace(&fixture, Token::new(0x0600_7FFF)));
    }
}
