use std::env;
use std::sync::{Mutex, OnceLock};

use serde_json::Value;
use telcobot_cli::commands::{config, doctor, invoke, render, tools};

const USER: &str = "+14155550123";

#[test]
fn config_attributes_values_to_their_source() {
    with_env(&[("TELCOBOT_LLM_PROVIDER", "ollama"), ("TELCOBOT_LLM_MODEL", "llama3.1")], || {
        let output = config::run();

        assert!(output.starts_with("effective config"));
        assert!(output.contains("- llm.model = llama3.1 (source: env (TELCOBOT_LLM_MODEL))"));
        assert!(output.contains("- llm.base_url = http://localhost:11434/v1 (source: default)"));
        assert!(output.contains("- llm.api_key = <unset> (source: default)"));
        assert!(output.contains("- agent.history_limit = 15 (source: default)"));
        assert!(output.contains("- agent.max_sessions = 10000 (source: default)"));
    });
}

#[test]
fn config_redacts_api_keys() {
    with_env(&[("TELCOBOT_LLM_API_KEY", "sk-live-secret")], || {
        let output = config::run();

        assert!(output.contains("- llm.api_key = sk-*** (source: env (TELCOBOT_LLM_API_KEY))"));
        assert!(!output.contains("secret"));
    });
}

#[test]
fn config_reports_validation_failure_without_api_key() {
    with_env(&[], || {
        let output = config::run();
        assert!(output.starts_with("config validation failed"));
        assert!(output.contains("llm.api_key"));
    });
}

#[test]
fn doctor_passes_for_local_models() {
    with_env(&[("TELCOBOT_LLM_PROVIDER", "ollama")], || {
        let report = parse_payload(&doctor::run(true));

        assert_eq!(report["overall_status"], "pass");
        let names: Vec<&str> = report["checks"]
            .as_array()
            .expect("checks")
            .iter()
            .filter_map(|check| check["name"].as_str())
            .collect();
        assert_eq!(names, vec!["config_validation", "llm_client", "tool_registry", "welcome_markup"]);
    });
}

#[test]
fn doctor_fails_and_skips_llm_check_when_config_invalid() {
    with_env(&[], || {
        let report = parse_payload(&doctor::run(true));

        assert_eq!(report["overall_status"], "fail");
        assert_eq!(report["checks"][0]["status"], "fail");
        assert_eq!(report["checks"][1]["status"], "skipped");
        assert_eq!(report["checks"][2]["status"], "pass");

        let human = doctor::run(false);
        assert!(human.contains("- [skip] llm_client"));
    });
}

#[test]
fn tools_lists_every_billing_tool() {
    let result = tools::run();
    assert_eq!(result.exit_code, 0);

    let definitions = parse_payload(&result.output);
    let definitions = definitions.as_array().expect("definitions");
    assert_eq!(definitions.len(), 9);
    assert_eq!(definitions[0]["name"], "get_outstanding_invoices");
    assert_eq!(definitions[8]["name"], "get_information_from_billing_system");
    assert_eq!(definitions[4]["parameters"]["required"][1], "invoice_id");
}

#[test]
fn invoke_prints_the_envelope() {
    let args = format!(r#"{{"user_id":"{USER}","invoice_id":"INV-2024-0342"}}"#);
    let result = invoke::run("make_payment", &args);

    assert_eq!(result.exit_code, 0);
    let envelope = parse_payload(&result.output);
    assert_eq!(envelope["status"], "success");
    assert_eq!(envelope["data"]["message"], "Payment processed successfully");
}

#[test]
fn invoke_signals_error_envelopes_with_exit_code() {
    let result = invoke::run("validate_phone_number", r#"{"phone_number":"4155550123"}"#);

    assert_eq!(result.exit_code, 1);
    let envelope = parse_payload(&result.output);
    assert_eq!(envelope["status"], "error");
    assert_eq!(envelope["data"]["message"], "Client not found");
}

#[test]
fn invoke_rejects_unknown_tools_and_bad_arguments() {
    let unknown = invoke::run("cancel_contract", "{}");
    assert_eq!(unknown.exit_code, 3);
    assert_eq!(parse_payload(&unknown.output)["error_class"], "unknown_tool");

    let malformed = invoke::run("get_available_cards", "{user_id:");
    assert_eq!(malformed.exit_code, 2);
    assert_eq!(parse_payload(&malformed.output)["error_class"], "invalid_arguments");

    let missing = invoke::run("add_card", &format!(r#"{{"user_id":"{USER}"}}"#));
    assert_eq!(missing.exit_code, 2);
    assert_eq!(parse_payload(&missing.output)["command"], "invoke");
}

#[test]
fn render_converts_fenced_markup() {
    let result = render::render_source(
        "```jsx\n<View>\n  <Text>Card added</Text>\n  <Button title=\"Done\" onPress={handleSubmit} />\n</View>\n```",
    );

    assert_eq!(result.exit_code, 0);
    let tree = parse_payload(&result.output);
    assert_eq!(tree["children"][0]["children"], "Card added");
    assert_eq!(tree["children"][1]["props"]["onPress"], "handleSubmit");
}

#[test]
fn render_reports_parse_errors() {
    let result = render::render_source("<View><Text>unclosed</View>");

    assert_eq!(result.exit_code, 4);
    let payload = parse_payload(&result.output);
    assert_eq!(payload["command"], "render");
    assert_eq!(payload["error_class"], "markup_parse");
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "TELCOBOT_LLM_PROVIDER",
        "TELCOBOT_LLM_API_KEY",
        "TELCOBOT_LLM_BASE_URL",
        "TELCOBOT_LLM_MODEL",
        "TELCOBOT_LLM_TEMPERATURE",
        "TELCOBOT_LLM_TIMEOUT_SECS",
        "TELCOBOT_LLM_MAX_RETRIES",
        "TELCOBOT_AGENT_HISTORY_LIMIT",
        "TELCOBOT_AGENT_MAX_TOOL_STEPS",
        "TELCOBOT_AGENT_MAX_SESSIONS",
        "TELCOBOT_SERVER_BIND_ADDRESS",
        "TELCOBOT_SERVER_PORT",
        "TELCOBOT_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "TELCOBOT_LOGGING_LEVEL",
        "TELCOBOT_LOGGING_FORMAT",
        "TELCOBOT_LOG_LEVEL",
        "TELCOBOT_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
