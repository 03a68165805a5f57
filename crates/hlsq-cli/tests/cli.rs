//! Command-line behavior of the `hlsq` binary

use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn hlsq() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_hlsq"));
    command.env_remove("RUST_LOG");
    command
}

#[test]
fn test_vsynth_without_synth_is_usage_error() {
    let temp_dir = TempDir::new().unwrap();
    let project = temp_dir.path().join("proj");

    let output = hlsq()
        .arg("compare")
        .arg(temp_dir.path().join("missing.json"))
        .arg("-p")
        .arg("-v")
        .arg("--project")
        .arg(&project)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(64));
    assert!(String::from_utf8_lossy(&output.stderr)
        .contains("HLS synthesis must be enabled in order to run Verilog synthesis"));
    assert!(!project.exists());
}

#[test]
fn test_compare_simulation_log() {
    let temp_dir = TempDir::new().unwrap();
    let data = temp_dir.path().join("data.json");
    let csim = temp_dir.path().join("csim.log");
    fs::write(
        &data,
        r#"{"samples": [[0.0], [0.0], [0.0], [0.0]], "labels": [0, 1, 2, 2]}"#,
    )
    .unwrap();
    fs::write(&csim, "0.9 0.1 0.0\n0.1 0.8 0.1\n0.1 0.8 0.1\n0.0 0.1 0.9\n").unwrap();

    let output = hlsq()
        .arg("compare")
        .arg(&data)
        .arg("-c")
        .arg(&csim)
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Num samples: 4"));
    assert!(stdout.contains("The C simulation matched the ground truth 75.00% of the time"));
}

#[test]
fn test_compare_requires_a_variant() {
    let temp_dir = TempDir::new().unwrap();
    let output = hlsq()
        .arg("compare")
        .arg(temp_dir.path().join("data.json"))
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert_ne!(output.status.code(), Some(64));
}

#[test]
fn test_log_length_must_match_dataset() {
    let temp_dir = TempDir::new().unwrap();
    let data = temp_dir.path().join("data.json");
    let csim = temp_dir.path().join("csim.log");
    fs::write(&data, r#"{"samples": [[0.0], [0.0], [0.0]], "labels": [0, 1, 2]}"#).unwrap();
    fs::write(&csim, "0.9 0.1 0.0\n0.1 0.8 0.1\n0.1 0.1 0.8\n0.8 0.1 0.1\n").unwrap();

    let output = hlsq().arg("compare").arg(&data).arg("-c").arg(&csim).output().unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("cannot compare 4 predictions against 3"));

    let output = hlsq()
        .arg("compare")
        .arg(&data)
        .arg("-c")
        .arg(&csim)
        .args(["-n", "3"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout)
        .contains("The C simulation matched the ground truth 100.00% of the time"));
}

#[cfg(unix)]
mod with_toolchain {
    use super::hlsq;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use std::process::Output;
    use tempfile::TempDir;

    /// Stands in for the hls4ml CLI, leaving a csynth report after `build`
    const FAKE_HLS4ML: &str = r#"#!/bin/sh
if [ "$1" = "build" ]; then
  mkdir -p "$3/myproject_prj/solution1/syn/report"
  echo "Latency: 42 cycles" > "$3/myproject_prj/solution1/syn/report/myproject_csynth.rpt"
fi
"#;

    const NETWORK: &str = r#"{
        "name": "classifier",
        "input_size": 2,
        "layers": [
            {"name": "input_layer", "kind": "input"},
            {"name": "dense_1", "kind": "dense", "weights": [[1.0, 0.0], [0.0, 1.0], [-1.0, -1.0]], "bias": [0.0, 0.0, 0.0]},
            {"name": "output_layer", "kind": "activation", "function": "softmax"}
        ]
    }"#;

    struct Workspace {
        temp_dir: TempDir,
        project: PathBuf,
    }

    impl Workspace {
        fn new(network: &str) -> Self {
            let temp_dir = TempDir::new().unwrap();
            let bin = temp_dir.path().join("bin");
            fs::create_dir_all(&bin).unwrap();
            let tool = bin.join("hls4ml");
            fs::write(&tool, FAKE_HLS4ML).unwrap();
            fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();
            fs::write(temp_dir.path().join("net.json"), network).unwrap();
            fs::write(
                temp_dir.path().join("data.json"),
                r#"{"samples": [[1.0, 0.0], [0.0, 1.0], [-1.0, -1.0]], "labels": [0, 1, 2]}"#,
            )
            .unwrap();
            let project = temp_dir.path().join("proj");
            Self { temp_dir, project }
        }

        fn path(&self, name: &str) -> PathBuf {
            self.temp_dir.path().join(name)
        }

        fn compare(&self, flags: &[&str]) -> Output {
            hlsq()
                .env("VIVADO_BIN_DIR", self.path("bin"))
                .env("HLS4ML_WEIGHTS_PATH", self.path("net.json"))
                .arg("compare")
                .arg(self.path("data.json"))
                .args(flags)
                .arg("--project")
                .arg(&self.project)
                .output()
                .unwrap()
        }

        fn manifest(&self) -> String {
            fs::read_to_string(Path::new(&self.project).join(".project_info")).unwrap()
        }
    }

    #[test]
    fn test_synthesized_project_gets_manifest() {
        let workspace = Workspace::new(NETWORK);
        let output = workspace.compare(&["-p", "-s"]);
        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
        assert!(String::from_utf8_lossy(&output.stdout).contains("The hardware model matched the ground truth"));

        let manifest = workspace.manifest();
        let header = manifest.find("Project generated via").unwrap();
        let config = manifest.find("The corresponding HLS configuration was:").unwrap();
        let tested = manifest.find("The models were tested against 3 test samples").unwrap();
        let report = manifest.find("Dumping HLS csynth report:\n\nLatency: 42 cycles").unwrap();
        assert!(header < config && config < tested && tested < report);
    }

    #[test]
    fn test_topological_interface_detection() {
        let renamed = NETWORK.replace("input_layer", "features").replace("output_layer", "probs");
        let workspace = Workspace::new(&renamed);

        let named = workspace.compare(&["-p"]);
        assert!(!named.status.success());
        assert!(String::from_utf8_lossy(&named.stderr).contains("input layer 'input_layer' not found"));

        let topological = workspace.compare(&["-p", "--topological"]);
        assert!(topological.status.success(), "{}", String::from_utf8_lossy(&topological.stderr));
        assert!(workspace.manifest().contains("  probs\n"));
    }
}
