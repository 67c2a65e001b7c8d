//! Runs the `pinaka` binary against a CSV data directory.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn data_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    let write = |name: &str, body: &str| fs::write(dir.path().join(name), body).unwrap();

    write(
        "instruments.csv",
        "token,tsym,exchange,strike_step,lot_size,option_type,strike_price\n\
         1,NIFTY,NSE,50,25,,\n\
         11,NIFTY 100 CE,NFO,,,CE,100\n\
         12,NIFTY 150 PE,NFO,,,PE,150\n",
    );
    write(
        "index_ticks.csv",
        "token,ft,lp,ts,exchange,rt,pc\n\
         1,270,104,NIFTY,NSE,,\n\
         1,300,105,NIFTY,NSE,09:20:00,0.5\n",
    );
    write(
        "option_ticks.csv",
        "token,ft,lp,ts,exchange,rt,pc\n\
         11,300,8.5,NIFTY 100 CE,NFO,,\n\
         12,300,6.5,NIFTY 150 PE,NFO,,\n",
    );
    write(
        "orders.csv",
        "order_id,symbol,user_id,side,status,order_type,quantity,filled_quantity,price,average_price,created_at\n\
         a,NIFTY,u1,buy,filled,market,10,10,,100,\n\
         b,NIFTY,u1,sell,filled,market,4,4,,110,\n\
         c,NIFTY,u2,buy,pending,limit,5,0,99,,\n",
    );
    dir
}

fn pinaka(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pinaka"))
        .arg("--config")
        .arg(dir.join("Config.toml"))
        .args(args)
        .args(["--source", "csv", "--data-dir"])
        .arg(dir)
        .env("RUST_LOG", "warn")
        .output()
        .unwrap()
}

fn json_rows(output: &Output) -> Vec<Value> {
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice::<Vec<Value>>(&output.stdout).unwrap()
}

fn decimal(value: &Value) -> Decimal {
    value.as_str().unwrap().parse().unwrap()
}

// =============================================================================
// Commands
// =============================================================================

#[test]
fn base_index_json() {
    let dir = data_dir();
    let rows = json_rows(&pinaka(dir.path(), &["base-index", "--format", "json"]));

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["instrument_id"], 1);
    assert_eq!(rows[0]["ft"], 300);
    assert_eq!(decimal(&rows[0]["ibase"]), dec!(100));
    assert_eq!(decimal(&rows[0]["itop"]), dec!(150));
}

#[test]
fn option_pairs_json() {
    let dir = data_dir();
    let rows = json_rows(&pinaka(
        dir.path(),
        &["option-pairs", "--format", "json", "--depth", "2"],
    ));

    assert_eq!(rows.len(), 2);
    let level0 = &rows[0];
    assert_eq!(level0["level"], 0);
    assert_eq!(level0["ce_tsym"], "NIFTY 100 CE");
    assert_eq!(level0["pe_tsym"], "NIFTY 150 PE");
    assert_eq!(decimal(&level0["sum_lp"]), dec!(15));
    assert_eq!(decimal(&level0["risk_prec"]), dec!(-233.33));

    let level1 = &rows[1];
    assert_eq!(level1["level"], 1);
    assert!(level1["ce_token"].is_null());
    assert!(level1["sum_lp"].is_null());
}

#[test]
fn positions_with_mark() {
    let dir = data_dir();
    let rows = json_rows(&pinaka(
        dir.path(),
        &["positions", "--format", "json", "--mark", "NIFTY=105"],
    ));

    assert_eq!(rows.len(), 2);
    let u1 = &rows[0];
    assert_eq!(u1["user_id"], "u1");
    assert_eq!(u1["direction"], "LONG");
    assert_eq!(decimal(&u1["net_position"]), dec!(6));
    assert_eq!(decimal(&u1["realized_pnl"]), dec!(40));
    assert_eq!(decimal(&u1["unrealized_pnl"]), dec!(30));

    let u2 = &rows[1];
    assert_eq!(u2["open_buy_orders"], 1);
    assert_eq!(u2["direction"], "FLAT");
}

#[test]
fn positions_user_filter() {
    let dir = data_dir();
    let rows = json_rows(&pinaka(
        dir.path(),
        &["positions", "--format", "json", "--user", "u2"],
    ));
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["user_id"], "u2");
}

#[test]
fn all_writes_view_files() {
    let dir = data_dir();
    let out = dir.path().join("out");
    let output = pinaka(dir.path(), &["all", "--out-dir", out.to_str().unwrap()]);
    assert!(output.status.success());

    for file in ["base_index.csv", "option_pairs.csv", "positions.csv"] {
        let body = fs::read_to_string(out.join(file)).unwrap();
        assert!(body.lines().count() > 1, "{file} has no rows");
    }
}

#[test]
fn table_output_counts_rows() {
    let dir = data_dir();
    let output = pinaka(dir.path(), &["base-index"]);
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("ibase"));
    assert!(stdout.trim_end().ends_with("1 rows"));
}

#[test]
fn csv_source_requires_data_dir() {
    let output = Command::new(env!("CARGO_BIN_EXE_pinaka"))
        .args(["positions", "--source", "csv"])
        .output()
        .unwrap();
    assert!(!output.status.success());
}
