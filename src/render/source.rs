use crate::model::PackageTable;
use crate::pipeline::BuildOutput;

/// Render a self-contained Rust module wrapping the binding statements.
///
/// The template is filled with `replace` rather than `format!()` so the braces
/// of the generated code need no escaping.
pub fn render_rust_module(output: &BuildOutput) -> String {
    const TEMPLATE: &str = r#"// Generated by netcompose. Do not edit.
//
// Required packages:
__PACKAGES__
#[allow(clippy::all)]
pub async fn connect() -> Result<impl Sized, Box<dyn std::error::Error>> {
__STATEMENTS__
    Ok(__ENTRY__)
}
"#;

    let mut packages = String::new();
    for (name, req) in &output.packages {
        packages.push_str(&format!("//   {} {}", name, req.range));
        if !req.sublibs.is_empty() {
            let sublibs: Vec<&str> = req.sublibs.iter().map(String::as_str).collect();
            packages.push_str(&format!(" ({})", sublibs.join(", ")));
        }
        packages.push('\n');
    }
    if packages.is_empty() {
        packages.push_str("//   (none)\n");
    }

    let statements: Vec<String> = output
        .statements
        .iter()
        .map(|s| format!("    {}", s.text))
        .collect();

    TEMPLATE
        .replace("__PACKAGES__", &packages)
        .replace("__STATEMENTS__", &statements.join("\n"))
        .replace("__ENTRY__", &output.entry)
}

/// Render the merged package table as a Cargo-style dependency section.
pub fn render_manifest(packages: &PackageTable) -> String {
    let mut out = String::from("[dependencies]\n");
    for (name, req) in packages {
        let version = match (&req.range.min, &req.range.max) {
            (None, None) => "*".to_string(),
            _ => req.range.to_string(),
        };
        if req.sublibs.is_empty() {
            out.push_str(&format!("{} = {:?}\n", name, version));
        } else {
            let features: Vec<String> = req.sublibs.iter().map(|s| format!("{:?}", s)).collect();
            out.push_str(&format!(
                "{} = {{ version = {:?}, features = [{}] }}\n",
                name,
                version,
                features.join(", ")
            ));
        }
    }
    out
}

/// Render the whole build output as pretty JSON.
pub fn render_json(output: &BuildOutput) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(output)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PackageRequirement;
    use crate::render::emit::Statement;
    use crate::spec::VersionRange;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    fn output() -> BuildOutput {
        let mut packages = crate::model::PackageTable::new();
        packages.insert(
            "tcpip".to_string(),
            PackageRequirement {
                range: VersionRange::new(Some("8.0".parse().unwrap()), Some("9.0".parse().unwrap())),
                sublibs: ["ipv4".to_string()].into_iter().collect(),
                required_by: BTreeSet::new(),
            },
        );
        packages.insert(
            "ethernet".to_string(),
            PackageRequirement {
                range: VersionRange::new(Some("3.0".parse().unwrap()), None),
                sublibs: BTreeSet::new(),
                required_by: BTreeSet::new(),
            },
        );
        BuildOutput {
            packages,
            statements: vec![
                Statement {
                    ident: "ethernet_0".into(),
                    device: "ethernet".into(),
                    text: "let ethernet_0 = ethernet::connect().await?;".into(),
                },
                Statement {
                    ident: "ipv4_1".into(),
                    device: "ipv4_static".into(),
                    text: "let ipv4_1 = tcpip::ipv4::connect(&ethernet_0).await?;".into(),
                },
            ],
            entry: "ipv4_1".into(),
        }
    }

    #[test]
    fn rust_module_binds_in_order_and_returns_entry() {
        let text = render_rust_module(&output());
        let expected = r#"// Generated by netcompose. Do not edit.
//
// Required packages:
//   ethernet >=3.0
//   tcpip >=8.0, <9.0 (ipv4)

#[allow(clippy::all)]
pub async fn connect() -> Result<impl Sized, Box<dyn std::error::Error>> {
    let ethernet_0 = ethernet::connect().await?;
    let ipv4_1 = tcpip::ipv4::connect(&ethernet_0).await?;
    Ok(ipv4_1)
}
"#;
        assert_eq!(text, expected);
    }

    #[test]
    fn manifest_lists_features_for_sublibs() {
        assert_eq!(
            render_manifest(&output().packages),
            "[dependencies]\nethernet = \">=3.0\"\ntcpip = { version = \">=8.0, <9.0\", features = [\"ipv4\"] }\n"
        );
    }

    #[test]
    fn json_carries_entry_and_packages() {
        let json: serde_json::Value = serde_json::from_str(&render_json(&output()).unwrap()).unwrap();
        assert_eq!(json["entry"], "ipv4_1");
        assert_eq!(json["packages"]["tcpip"]["range"]["min"], "8.0");
        assert_eq!(json["statements"][0]["device"], "ethernet");
    }
}
