// tests/integration_tests.rs - The pcclog binary end to end

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::io::Write;
use tempfile::NamedTempFile;

const WRAPPED_LINE: &str = "10-16 12:34:56.789 1234 1301 D NetworkTypeController: Physical channel configs updated: anchorNrCell=5, nrBandwidths=[20000], nrBands=[78], configs=[{mConnectionStatus=PrimaryServing,mCellBandwidthDownlinkKhz=20000,mCellBandwidthUplinkKhz=20000,mNetworkType=NR,mFrequencyRange=2,mDownlinkChannelNumber=500000,mUplinkChannelNumber=500000,mContextIds=[1],mPhysicalCellId=100,mBand=78,mDownlinkFrequency=3500.0,mUplinkFrequency=3500.0},{mConnectionStatus=SecondaryServing,mCellBandwidthDownlinkKhz=10000,mCellBandwidthUplinkKhz=0,mNetworkType=LTE,mFrequencyRange=1,mDownlinkChannelNumber=1850,mUplinkChannelNumber=19850,mContextIds=[],mPhysicalCellId=42,mBand=3,mDownlinkFrequency=1842.5,mUplinkFrequency=1747.5}]";

const DIRECT_LINE: &str = "10-16 12:35:01.002 1234 1301 D NetworkTypeController: Physical channel configs updated: [{mConnectionStatus=PrimaryServing,mCellBandwidthDownlinkKhz=5000,mCellBandwidthUplinkKhz=5000,mNetworkType=LTE,mFrequencyRange=1,mDownlinkChannelNumber=100,mUplinkChannelNumber=18100,mContextIds=[],mPhysicalCellId=7,mBand=1,mDownlinkFrequency=2120.0,mUplinkFrequency=1930.0}]";

const NOISE: &str = "10-16 12:34:57.000 1234 1301 D RILJ: [UNSL]< UNSOL_SIGNAL_STRENGTH";

fn log_file(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file.flush().unwrap();
    file
}

fn pcclog() -> Command {
    let mut cmd = Command::cargo_bin("pcclog").unwrap();
    cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_jsonl_one_record_per_update() {
    let file = log_file(&["--------- beginning of radio", WRAPPED_LINE, NOISE, WRAPPED_LINE]);

    let output = pcclog()
        .args(["--sdk", "35", "--format", "jsonl", "--input"])
        .arg(file.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let records: Vec<Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(records.len(), 2);

    let first = &records[0];
    assert_eq!(first["sequence"], 1);
    assert_eq!(first["strategy"], "wrapped");
    assert_eq!(first["date"], "10-16");
    assert_eq!(first["time"], "12:34:56.789");
    assert_eq!(first["envelope"]["anchorNrCellId"], "5");
    assert_eq!(first["envelope"]["nrBands"], "[78]");

    let configs = first["configs"].as_array().unwrap();
    assert_eq!(configs.len(), 2);
    assert_eq!(configs[0]["connectionStatus"], "PrimaryServing");
    assert_eq!(configs[0]["contextIds"], "[1]");
    assert_eq!(configs[1]["physicalCellId"], "42");
    assert_eq!(configs[1]["downlinkFrequency"], "1842.5");

    assert_eq!(records[1]["sequence"], 2);
    assert_eq!(records[1]["historyLength"], 2);
}

#[test]
fn test_direct_format_on_android_14() {
    let file = log_file(&[DIRECT_LINE]);

    let output = pcclog()
        .args(["--sdk", "34", "-F", "jsonl", "-i"])
        .arg(file.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let record: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(record["strategy"], "direct");
    assert!(record["envelope"].is_null());
    assert_eq!(record["configs"][0]["band"], "1");
}

#[test]
fn test_summary_output() {
    let file = log_file(&[WRAPPED_LINE]);

    pcclog()
        .args(["--sdk", "35", "--input"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("== update 1 (10-16 12:34:56.789, wrapped)"))
        .stdout(predicate::str::contains("anchorNrCell = 5"))
        .stdout(predicate::str::contains("Gen\t(Pri|Sec)Cell\tBand/BandWidth\tPCI"))
        .stdout(predicate::str::contains("NR\tPrimaryServing\t78/20000\t100"))
        .stdout(predicate::str::contains("LTE\tSecondaryServing\t3/10000\t42"))
        .stdout(predicate::str::contains("-- history (1 of 1)"));
}

#[test]
fn test_detail_output_shows_missing_values() {
    // Envelope present but no config matches: every config is gone
    let line = "10-16 12:34:56.789 1234 1301 D NetworkTypeController: Physical channel configs updated: anchorNrCell=5, nrBandwidths=[], nrBands=[], configs=[]";
    let file = log_file(&[line]);

    pcclog()
        .args(["--sdk", "35", "--format", "detail", "--history", "0", "--input"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("anchorNrCell = 5"))
        .stdout(predicate::str::contains("(no configs)"))
        .stdout(predicate::str::contains("-- history").not());
}

#[test]
fn test_reads_stdin() {
    pcclog()
        .args(["--sdk", "35", "--format", "jsonl", "--input", "-"])
        .write_stdin(format!("{}\n{}\n", NOISE, WRAPPED_LINE))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"anchorNrCellId\":\"5\""));
}

#[test]
fn test_no_updates_exits_with_2() {
    let file = log_file(&["--------- beginning of radio", NOISE, NOISE]);

    pcclog()
        .args(["--sdk", "35", "--input"])
        .arg(file.path())
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_missing_input_file_is_an_error() {
    pcclog()
        .args(["--sdk", "35", "--input", "/nonexistent/radio.log"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to open log source"));
}

#[test]
fn test_missing_command_is_an_error() {
    pcclog()
        .args(["--sdk", "35", "--command", "pcclog-test-no-such-binary -b radio"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("pcclog-test-no-such-binary"));
}

#[test]
fn test_debug_prints_final_statistics() {
    let file = log_file(&[WRAPPED_LINE, NOISE, "short"]);

    pcclog()
        .args(["--sdk", "35", "--debug", "--format", "jsonl", "--input"])
        .arg(file.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Final statistics:"))
        .stderr(predicate::str::contains("Lines processed: 3"))
        .stderr(predicate::str::contains("Updates: 1"));
}

#[test]
fn test_custom_marker() {
    let file = log_file(&[WRAPPED_LINE, DIRECT_LINE]);

    pcclog()
        .args(["--sdk", "34", "--marker", "onPhysicalChannelConfigChanged", "--input"])
        .arg(file.path())
        .assert()
        .code(2);
}

#[cfg(unix)]
#[test]
fn test_log_command_output_is_parsed() {
    let file = log_file(&[WRAPPED_LINE]);
    let command = format!("cat {}", file.path().display());

    pcclog()
        .args(["--sdk", "35", "-F", "jsonl", "--command", &command])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"sequence\":1"));
}

#[cfg(unix)]
#[test]
fn test_interrupt_stops_cleanly() {
    use std::process::{Command as StdCommand, Stdio};
    use std::time::{Duration, Instant};

    let mut child = StdCommand::new(assert_cmd::cargo::cargo_bin("pcclog"))
        .args(["--sdk", "35", "--command", "sleep 30"])
        .env("NO_COLOR", "1")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    // Let the session reach its render loop before interrupting
    std::thread::sleep(Duration::from_millis(1000));
    let status = StdCommand::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());

    let deadline = Instant::now() + Duration::from_secs(10);
    let exit = loop {
        if let Some(exit) = child.try_wait().unwrap() {
            break exit;
        }
        if Instant::now() > deadline {
            child.kill().unwrap();
            panic!("pcclog did not stop after SIGINT");
        }
        std::thread::sleep(Duration::from_millis(50));
    };

    // Handled interrupt: no update was rendered, so exit code 2 rather than a signal death
    assert_eq!(exit.code(), Some(2));
}
