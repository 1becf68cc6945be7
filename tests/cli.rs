use assert_cmd::Command;
use predicates::str::contains;
use tempfile::TempDir;

fn kicho(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("kicho").expect("binary exists");
    cmd.env("HOME", home.path());
    cmd.env("NO_COLOR", "1");
    cmd
}

fn init(home: &TempDir) {
    let data_dir = home.path().join("kicho-data");
    kicho(home)
        .args(["init", "--data-dir"])
        .arg(&data_dir)
        .assert()
        .success();
}

fn add_client(home: &TempDir, name: &str) {
    kicho(home)
        .args(["clients", "add", name, "--industry", "driver"])
        .assert()
        .success();
}

#[test]
fn init_creates_database_and_status_reports_it() {
    let home = TempDir::new().unwrap();
    init(&home);
    kicho(&home)
        .arg("status")
        .assert()
        .success()
        .stdout(contains("Clients:"));
}

#[test]
fn status_without_init_points_at_setup() {
    let home = TempDir::new().unwrap();
    kicho(&home)
        .arg("status")
        .assert()
        .success()
        .stdout(contains("kicho init"));
}

#[test]
fn clients_add_and_list() {
    let home = TempDir::new().unwrap();
    init(&home);
    add_client(&home, "山田運送");
    kicho(&home)
        .args(["clients", "list"])
        .assert()
        .success()
        .stdout(contains("山田運送"));
}

#[test]
fn rules_rejects_dual_scope() {
    let home = TempDir::new().unwrap();
    init(&home);
    add_client(&home, "山田運送");
    kicho(&home)
        .args([
            "rules", "add", "--account", "501", "--tax", "課税仕入 10%",
            "--supplier", "eneos", "--client", "山田運送", "--industry", "driver",
        ])
        .assert()
        .failure()
        .stderr(contains("not both"));
}

#[test]
fn process_review_export_round() {
    let home = TempDir::new().unwrap();
    init(&home);
    add_client(&home, "山田運送");

    let receipt = home.path().join("fuel.json");
    std::fs::write(
        &receipt,
        r#"{"date": "2026-07-03", "supplier": "ENEOS 川崎", "amount": 4800, "tax_amount": 436}"#,
    )
    .unwrap();

    kicho(&home)
        .arg("process")
        .arg(&receipt)
        .args(["--client", "山田運送"])
        .assert()
        .success()
        .stdout(contains("1 processed"));

    kicho(&home)
        .args(["review", "list", "--client", "山田運送"])
        .assert()
        .success()
        .stdout(contains("ENEOS"));

    // Entry IDs start at 1 in a fresh database.
    kicho(&home)
        .args(["review", "approve", "1"])
        .assert()
        .success();

    kicho(&home)
        .args(["export", "--client", "山田運送"])
        .assert()
        .success()
        .stdout(contains("1 exported"));
}

#[test]
fn unknown_client_is_an_error() {
    let home = TempDir::new().unwrap();
    init(&home);
    kicho(&home)
        .args(["summary", "--client", "存在しない"])
        .assert()
        .failure()
        .stderr(contains("Error"));
}

#[test]
fn workflow_lifecycle_over_cli() {
    let home = TempDir::new().unwrap();
    init(&home);
    add_client(&home, "配信者A");

    kicho(&home)
        .args(["workflow", "start", "--client", "配信者A"])
        .assert()
        .success()
        .stdout(contains("step 1/8"));

    kicho(&home)
        .args(["workflow", "advance", "--client", "配信者A"])
        .assert()
        .success()
        .stdout(contains("step 2/8"));

    kicho(&home)
        .args(["workflow", "jump", "--client", "配信者A", "5"])
        .assert()
        .success()
        .stdout(contains("step 5/8"));

    kicho(&home)
        .args(["workflow", "back", "--client", "配信者A"])
        .assert()
        .success()
        .stdout(contains("step 4/8"));

    kicho(&home)
        .args(["workflow", "mark", "--client", "配信者A", "2"])
        .assert()
        .success()
        .stdout(contains("2\u{2713}"));

    kicho(&home)
        .args(["workflow", "complete", "--client", "配信者A"])
        .assert()
        .success()
        .stdout(contains("completed"));

    // Completion removes the row; status now prompts to start over.
    kicho(&home)
        .args(["workflow", "status", "--client", "配信者A"])
        .assert()
        .success()
        .stdout(contains("No active workflow"));
}

#[test]
fn demo_seeds_sample_data() {
    let home = TempDir::new().unwrap();
    init(&home);
    kicho(&home)
        .arg("demo")
        .assert()
        .success()
        .stdout(contains("Demo data loaded"));
}
