//! Turning a test selection into something executable
//!
//! Every builder here is a pure function of the [`TestSet`] and the
//! selected names. Running the result is the dispatcher's job.

use gorig_foundation::{
    DebugLaunch, GorigError, GorigResult, ShellCommand, StructuredRun, TestEntry, TestItem,
    TestKind, TestSet,
};

/// Flags appended to every generated `go test` command
pub const GO_TEST_FLAGS: &str = "-timeout 30s -v -count 1";

/// Payload for gopls `run_tests`
///
/// Names are split by prefix into tests and benchmarks; anything else is
/// dropped.
pub fn to_structured_run(set: &TestSet, selection: &[String]) -> GorigResult<StructuredRun> {
    let uri = set.document_uri().ok_or(GorigError::NoActiveDocument)?;

    let mut tests = Vec::new();
    let mut benchmarks = Vec::new();
    for name in selection {
        match TestKind::from_name(name) {
            Some(TestKind::Test) => tests.push(name.clone()),
            Some(TestKind::Benchmark) => benchmarks.push(name.clone()),
            None => {}
        }
    }

    if tests.is_empty() && benchmarks.is_empty() {
        return Err(GorigError::EmptySelection);
    }
    Ok(StructuredRun {
        uri: uri.to_string(),
        tests,
        benchmarks,
    })
}

/// A `go test` command line for the selection
///
/// A lone benchmark runs with `-bench` and no tests. Several names collapse
/// into one `-run` alternation that only keeps the `Test` names.
pub fn to_shell_command(set: &TestSet, selection: &[String]) -> GorigResult<ShellCommand> {
    let container = set.container().ok_or(GorigError::ContainerUnresolved)?;

    let selector = match selection {
        [] => return Err(GorigError::EmptySelection),
        [name] if TestKind::from_name(name) == Some(TestKind::Benchmark) => {
            format!("-bench '^{name}$' -run XXX")
        }
        [name] => format!("-run '^{name}$'"),
        names => {
            let tests: Vec<&str> = names
                .iter()
                .filter(|n| TestKind::from_name(n) == Some(TestKind::Test))
                .map(String::as_str)
                .collect();
            if tests.is_empty() {
                return Err(GorigError::EmptySelection);
            }
            format!("-run '{}'", anchored_alternation(&tests))
        }
    };

    Ok(ShellCommand {
        text: format!("go test {container} {selector} {GO_TEST_FLAGS}"),
    })
}

/// Debugger launch running exactly the selected names
pub fn to_debug_launch(set: &TestSet, selection: &[String]) -> GorigResult<DebugLaunch> {
    let container = set.container().ok_or(GorigError::ContainerUnresolved)?;
    if selection.is_empty() {
        return Err(GorigError::EmptySelection);
    }

    let names: Vec<&str> = selection.iter().map(String::as_str).collect();
    Ok(DebugLaunch {
        name: names.join(" "),
        program: container.to_string(),
        test_pattern: anchored_alternation(&names),
    })
}

/// The set a list item stands for, rebuilt from the item alone
///
/// Items outlive the document they were discovered in, so the document
/// URI and container travel with the item rather than being resampled.
pub fn item_set(item: &TestItem) -> TestSet {
    TestSet::new(
        item.document_uri.clone(),
        item.container.clone(),
        item.tests.iter().cloned().filter_map(TestEntry::from_name),
    )
}

fn anchored_alternation(names: &[&str]) -> String {
    format!("^({})$", names.join("|"))
}
