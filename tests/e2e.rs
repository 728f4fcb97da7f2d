use std::process::Command;

use serde_json::{Value, json};

fn run(fixture: &str, args: &[&str]) -> (String, String, bool) {
    let path = format!("tests/fixtures/{fixture}");
    let output = Command::new(env!("CARGO_BIN_EXE_debt-payoff"))
        .arg(&path)
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to run binary");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn parse(stdout: &str) -> Value {
    serde_json::from_str(stdout).expect("stdout is not json")
}

#[test]
fn household_request() {
    let (stdout, stderr, success) = run("household.json", &[]);

    assert!(success);
    assert!(stderr.is_empty());

    let report = parse(&stdout);
    assert_eq!(report["avalanche"]["monthsToPayoff"], json!(43));
    assert_eq!(report["avalanche"]["totalInterestPaid"], json!(2981.15));
    assert_eq!(report["snowball"]["monthsToPayoff"], json!(44));
    assert_eq!(report["snowball"]["totalInterestPaid"], json!(3035.69));
    assert_eq!(report["minimumOnly"]["monthsToPayoff"], json!(57));
    assert_eq!(report["minimumOnly"]["totalInterestPaid"], json!(4588.71));
    assert_eq!(report["interestSavedAvalancheVsMinimum"], json!(1607.57));
    assert_eq!(report["interestSavedSnowballVsMinimum"], json!(1553.02));

    // numeric ids come back as strings
    assert_eq!(report["overview"]["highestInterestDebt"], json!("1"));
    assert_eq!(report["debts"][1]["monthsToPayoff"], json!(114));
}

#[test]
fn csv_input_with_extra_payment_flag() {
    let (stdout, _, success) = run("two_cards.csv", &["--extra-payment", "200"]);

    assert!(success);
    let report = parse(&stdout);
    assert_eq!(report["avalanche"]["totalInterestPaid"], json!(348.55));
    assert_eq!(report["snowball"]["totalInterestPaid"], json!(473.44));
    assert_eq!(report["snowball"]["payoffOrder"][0]["id"], json!("B"));
    assert_eq!(report["snowball"]["payoffOrder"][0]["month"], json!(5));
}

#[test]
fn trace_prints_csv_balances() {
    let (stdout, _, success) = run("two_cards.json", &["--trace", "avalanche"]);

    assert!(success);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "month,id,balance");
    assert!(lines[1].starts_with("1,A,"));
    assert_eq!(lines.last(), Some(&"14,B,0.00"));
}

#[test]
fn invalid_input_is_rejected() {
    let (stdout, stderr, success) = run("negative_balance.json", &[]);

    assert!(!success);
    assert!(stderr.contains("negative balance"));

    let error = parse(&stdout);
    let message = error["error"].as_str().unwrap();
    assert!(message.starts_with("invalid input: debt refund"));
}

#[test]
fn non_convergent_plan_names_the_debt() {
    let (stdout, _, success) = run("payday_loan.json", &[]);

    assert!(!success);
    let error = parse(&stdout);
    let message = error["error"].as_str().unwrap();
    assert!(message.contains("payday"));
    assert!(message.contains("interest against 25.0000 paid"));
}

#[test]
fn negative_policy_flag_is_rejected() {
    let (stdout, _, success) = run("payday_loan.json", &["--minimum-floor=-1"]);

    assert!(!success);
    assert!(stdout.contains("--minimum-floor must be a non-negative number"));
}

#[test]
fn ceiling_flag_limits_the_simulation() {
    let (stdout, _, success) = run("two_cards.json", &["--max-months", "10"]);

    assert!(!success);
    let error = parse(&stdout);
    let message = error["error"].as_str().unwrap();
    assert!(message.starts_with("avalanche plan still owes on A, B after 10 months"));
}

#[test]
fn trace_of_non_convergent_plan_fails() {
    let (stdout, stderr, success) = run("payday_loan.json", &["--trace", "avalanche"]);

    assert!(!success);
    assert!(stdout.starts_with("month,id,balance\n1,payday,"));
    assert!(stderr.contains("avalanche plan still owes on payday"));

    // the error document follows the rows written before the failure
    let start = stdout.rfind('{').expect("no error document");
    let error = parse(&stdout[start..]);
    assert!(error["error"].as_str().unwrap().contains("payday"));
}

#[test]
fn saturating_number_is_rejected() {
    let (stdout, _, success) = run("two_cards.json", &["--extra-payment", "1e20"]);

    assert!(!success);
    assert!(stdout.contains("--extra-payment must be a non-negative number"));
}
