//! Integration tests for CLI commands

use std::path::Path;
use std::process::{Command, Output};

/// Run crdform isolated from any user or environment configuration
fn crdform_in(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_crdform"))
        .args(args)
        .env_remove("CRDFORM_CONFIG")
        .env_remove("CRDFORM_DEFINITIONS")
        .env("XDG_CONFIG_HOME", home)
        .current_dir(home)
        .output()
        .expect("Failed to execute crdform")
}

fn crdform(args: &[&str]) -> Output {
    let home = tempfile::tempdir().unwrap();
    crdform_in(home.path(), args)
}

/// Get the fixtures path
fn fixtures_path() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/../../fixtures")
}

fn fixture(name: &str) -> String {
    format!("{}/{}", fixtures_path(), name)
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

const CERTIFICATE: &str = "k8s_cert_manager_io_certificate_v1";

mod resources_command {
    use super::*;

    #[test]
    fn test_lists_builtin_types() {
        let output = crdform(&["resources"]);
        assert!(output.status.success());
        let out = stdout(&output);
        assert!(out.contains(CERTIFICATE));
        assert!(out.contains("ClusterIssuer (cluster)"));
    }

    #[test]
    fn test_json_output() {
        let output = crdform(&["resources", "--json"]);
        let json: serde_json::Value =
            serde_json::from_str(&stdout(&output)).expect("Output should be valid JSON");
        let types = json.as_array().unwrap();
        assert_eq!(types.len(), 4);
        assert_eq!(types[0]["typeName"], CERTIFICATE);
    }

    #[test]
    fn test_config_file() {
        let output = crdform(&["--config", &fixture("crdform.yaml"), "resources"]);
        assert!(output.status.success(), "{}", stderr(&output));
        let out = stdout(&output);
        assert!(out.contains("test_example_com_gadget_v1"));
        assert!(!out.contains(CERTIFICATE));
    }
}

mod schema_command {
    use super::*;

    #[test]
    fn test_attribute_tree() {
        let output = crdform(&["schema", CERTIFICATE]);
        assert!(output.status.success());
        let out = stdout(&output);
        assert!(out.contains("secret_name"));
        assert!(out.contains("issuer_ref"));
        assert!(out.contains("computed"));
    }

    #[test]
    fn test_json_schema() {
        let output = crdform(&["schema", CERTIFICATE, "--json"]);
        let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
        assert!(json["properties"]["spec"]["properties"]["secret_name"].is_object());
        assert!(json["properties"].get("id").is_none());
    }

    #[test]
    fn test_unknown_type_suggests() {
        let output = crdform(&["schema", "certificate_v1"]);
        assert_eq!(output.status.code(), Some(4));
        assert!(stderr(&output).contains(CERTIFICATE));
    }
}

mod validate_command {
    use super::*;

    #[test]
    fn test_valid_config() {
        let output = crdform(&["validate", CERTIFICATE, "-f", &fixture("configs/certificate.yaml")]);
        assert!(output.status.success(), "{}", stdout(&output));
        assert!(stdout(&output).contains("Configuration is valid"));
    }

    #[test]
    fn test_invalid_name() {
        let output = crdform(&[
            "validate",
            CERTIFICATE,
            "-f",
            &fixture("configs/certificate-invalid.yaml"),
        ]);
        assert_eq!(output.status.code(), Some(2));
        assert!(stdout(&output).contains("metadata.name"));
    }

    #[test]
    fn test_set_fixes_invalid_name() {
        let output = crdform(&[
            "validate",
            CERTIFICATE,
            "-f",
            &fixture("configs/certificate-invalid.yaml"),
            "--set",
            "metadata.name=valid-name-1",
        ]);
        assert!(output.status.success(), "{}", stdout(&output));
    }

    #[test]
    fn test_json_output_with_errors() {
        let output = crdform(&[
            "validate",
            CERTIFICATE,
            "-f",
            &fixture("configs/certificate-invalid.yaml"),
            "--json",
        ]);
        let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
        assert_eq!(json["valid"], false);
        assert_eq!(json["diagnostics"][0]["attribute"], "metadata.name");
    }
}

mod render_command {
    use super::*;

    #[test]
    fn test_render_certificate() {
        let output = crdform(&["render", CERTIFICATE, "-f", &fixture("configs/certificate.yaml")]);
        assert!(output.status.success(), "{}", stderr(&output));
        let out = stdout(&output);
        assert!(out.starts_with("apiVersion: cert-manager.io/v1\nkind: Certificate\n"));
        assert!(out.contains("  namespace: prod\n"));
        assert!(out.contains("secretName: web-tls"));
        assert!(out.contains("issuerRef:"));
    }

    #[test]
    fn test_cluster_scoped_has_no_namespace() {
        let output = crdform(&[
            "render",
            "k8s_cert_manager_io_cluster_issuer_v1",
            "-f",
            &fixture("configs/cluster-issuer.yaml"),
        ]);
        assert!(output.status.success());
        assert_eq!(
            stdout(&output),
            "apiVersion: cert-manager.io/v1\nkind: ClusterIssuer\nmetadata:\n  name: my-cluster\n"
        );
    }

    #[test]
    fn test_set_overrides_file() {
        let output = crdform(&[
            "render",
            CERTIFICATE,
            "-f",
            &fixture("configs/certificate.yaml"),
            "--set",
            "spec.secret_name=other-tls",
        ]);
        assert!(stdout(&output).contains("secretName: other-tls"));
    }

    #[test]
    fn test_invalid_config_renders_nothing() {
        let output = crdform(&[
            "render",
            CERTIFICATE,
            "-f",
            &fixture("configs/certificate-invalid.yaml"),
        ]);
        assert_eq!(output.status.code(), Some(2));
        assert!(stdout(&output).is_empty());
        assert!(stderr(&output).contains("metadata.name"));
    }

    #[test]
    fn test_missing_config_file() {
        let output = crdform(&["render", CERTIFICATE, "-f", "/nonexistent/config.yaml"]);
        assert_eq!(output.status.code(), Some(5));
    }

    #[test]
    fn test_custom_payload_name() {
        let output = crdform(&[
            "--definitions",
            &fixture("definitions"),
            "--no-builtin",
            "render",
            "k8s_example_com_gadget_v1",
            "-f",
            &fixture("configs/gadget.yaml"),
        ]);
        assert!(output.status.success(), "{}", stderr(&output));
        let out = stdout(&output);
        assert!(out.contains("configuration:\n"));
        assert!(out.contains("  replicas: 3\n"));
        assert!(out.contains("  port: http\n"));
        assert!(out.contains("  podLabels:\n    tier: backend\n"));
    }

    #[test]
    fn test_output_file_and_state() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("issuer.yaml");
        let output = crdform(&[
            "render",
            "k8s_cert_manager_io_cluster_issuer_v1",
            "-f",
            &fixture("configs/cluster-issuer.yaml"),
            "--show-state",
            "-o",
            file.to_str().unwrap(),
        ]);
        assert!(output.status.success());
        let state: serde_yaml::Value =
            serde_yaml::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
        assert!(state["id"].as_i64().unwrap() > 0);
        assert_eq!(state["kind"].as_str(), Some("ClusterIssuer"));
    }
}

mod lifecycle_commands {
    use super::*;

    fn state_json(path: &Path) -> serde_json::Value {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn test_apply_create_then_update() {
        let home = tempfile::tempdir().unwrap();
        let config = fixture("configs/certificate.yaml");
        let key = format!("{CERTIFICATE}.web");

        let created = crdform_in(home.path(), &["apply", CERTIFICATE, "web", "-f", &config]);
        assert!(created.status.success(), "{}", stderr(&created));
        assert!(stderr(&created).contains("Created"));
        let state_file = home.path().join("crdform.state.json");
        let first = state_json(&state_file);
        assert_eq!(first[&key]["type"], CERTIFICATE);

        let updated = crdform_in(home.path(), &["apply", CERTIFICATE, "web", "-f", &config]);
        assert!(updated.status.success());
        assert!(stderr(&updated).contains("Updated"));
        let second = state_json(&state_file);

        assert_eq!(stdout(&created), stdout(&updated));
        assert_eq!(first[&key]["state"]["yaml"], second[&key]["state"]["yaml"]);
        assert!(
            second[&key]["state"]["id"].as_i64().unwrap()
                > first[&key]["state"]["id"].as_i64().unwrap()
        );
    }

    #[test]
    fn test_failed_apply_keeps_state() {
        let home = tempfile::tempdir().unwrap();
        let created = crdform_in(
            home.path(),
            &["apply", CERTIFICATE, "web", "-f", &fixture("configs/certificate.yaml")],
        );
        assert!(created.status.success());
        let state_file = home.path().join("crdform.state.json");
        let before = std::fs::read_to_string(&state_file).unwrap();

        let failed = crdform_in(
            home.path(),
            &["apply", CERTIFICATE, "web", "-f", &fixture("configs/certificate-invalid.yaml")],
        );
        assert_eq!(failed.status.code(), Some(2));
        assert_eq!(std::fs::read_to_string(&state_file).unwrap(), before);
    }

    #[test]
    fn test_apply_prints_nothing_when_state_cannot_be_saved() {
        let home = tempfile::tempdir().unwrap();
        // A directory in the way of the temporary state file fails the save
        std::fs::create_dir(home.path().join("blocked.json.tmp")).unwrap();

        let output = crdform_in(
            home.path(),
            &[
                "--state-file",
                "blocked.json",
                "apply",
                CERTIFICATE,
                "web",
                "-f",
                &fixture("configs/certificate.yaml"),
            ],
        );

        assert_eq!(output.status.code(), Some(5));
        assert!(stdout(&output).is_empty(), "{}", stdout(&output));
        assert!(!home.path().join("blocked.json").exists());
    }

    #[test]
    fn test_refresh_does_not_change_state() {
        let home = tempfile::tempdir().unwrap();
        crdform_in(
            home.path(),
            &["apply", CERTIFICATE, "web", "-f", &fixture("configs/certificate.yaml")],
        );
        let state_file = home.path().join("crdform.state.json");
        let before = std::fs::read_to_string(&state_file).unwrap();

        let output = crdform_in(home.path(), &["refresh", CERTIFICATE, "web"]);
        assert!(output.status.success());
        assert!(stdout(&output).contains("secretName: web-tls"));
        assert_eq!(std::fs::read_to_string(&state_file).unwrap(), before);
    }

    #[test]
    fn test_destroy_forgets_resource() {
        let home = tempfile::tempdir().unwrap();
        let state_file = home.path().join("custom").join("state.json");
        let state_arg = state_file.to_str().unwrap();
        crdform_in(
            home.path(),
            &[
                "--state-file",
                state_arg,
                "apply",
                CERTIFICATE,
                "web",
                "-f",
                &fixture("configs/certificate.yaml"),
            ],
        );
        assert!(state_file.exists());

        let destroyed = crdform_in(
            home.path(),
            &["--state-file", state_arg, "destroy", CERTIFICATE, "web"],
        );
        assert!(destroyed.status.success());
        assert_eq!(state_json(&state_file), serde_json::json!({}));

        let refreshed = crdform_in(
            home.path(),
            &["--state-file", state_arg, "refresh", CERTIFICATE, "web"],
        );
        assert_eq!(refreshed.status.code(), Some(2));
    }
}

mod import_crd_command {
    use super::*;

    #[test]
    fn test_prints_definition() {
        let output = crdform(&["import-crd", &fixture("crds/widgets.example.com.yaml")]);
        assert!(output.status.success(), "{}", stderr(&output));
        let out = stdout(&output);
        assert!(out.contains("apiVersion: example.com/v1"));
        assert!(out.contains("kind: Widget"));
        assert!(out.contains("type: intOrString"));
    }

    #[test]
    fn test_imported_definition_renders() {
        let dir = tempfile::tempdir().unwrap();
        let defs = dir.path().join("defs");
        let defs_arg = defs.to_str().unwrap();

        let imported = crdform(&[
            "import-crd",
            &fixture("crds/widgets.example.com.yaml"),
            "-o",
            defs_arg,
        ]);
        assert!(imported.status.success(), "{}", stderr(&imported));
        assert!(defs.join("widget-v1.yaml").exists());

        let output = crdform(&[
            "--definitions",
            defs_arg,
            "render",
            "k8s_example_com_widget_v1",
            "--set",
            "metadata.name=w",
            "--set",
            "spec.size=2",
            "--set",
            "spec.port=8080",
        ]);
        assert!(output.status.success(), "{}", stderr(&output));
        let out = stdout(&output);
        assert!(out.contains("kind: Widget"));
        assert!(out.contains("  size: 2\n"));
        assert!(out.contains("  port: 8080\n"));
    }

    #[test]
    fn test_not_a_crd() {
        let output = crdform(&["import-crd", &fixture("configs/gadget.yaml")]);
        assert_eq!(output.status.code(), Some(4));
    }
}
