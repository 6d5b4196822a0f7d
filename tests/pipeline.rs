use netcompose::compose::CompositionSpec;
use netcompose::devices::{Catalog, Devices};
use netcompose::graph::{ConfigRun, Graph, Node, ParamValue, Params};
use netcompose::spec::{
    ARP, DUAL_STACK_IP, Descriptor, ETHERNET, IPV4, IPV6, Package,
};
use netcompose::{BuildOutput, ConfigError, build};
use pretty_assertions::assert_eq;

/// Descriptors for the five-node scenario: link L, resolution A(L),
/// IPv4 V4(L, A), IPv6 V6(L), dual stack S(V4, V6).
struct Scenario {
    link: Descriptor,
    arp: Descriptor,
    ipv4: Descriptor,
    ipv6: Descriptor,
    dual: Descriptor,
}

impl Scenario {
    fn new() -> Self {
        Self {
            link: Descriptor::builder("ethernet", ETHERNET)
                .module("ethernet::Ethernet")
                .package(Package::new("ethernet").min("3.0").max("4.0"))
                .build()
                .unwrap(),
            arp: Descriptor::builder("arp", ARP)
                .module("arp::Arp")
                .input(ETHERNET)
                .package(Package::new("arp").min("3.0").max("4.0"))
                .build()
                .unwrap(),
            ipv4: Descriptor::builder("ipv4_static", IPV4)
                .prefix("ipv4")
                .module("tcpip::ipv4::Static")
                .inputs([ETHERNET, ARP])
                .package(Package::new("tcpip").min("7.0").max("9.0").sublib("ipv4"))
                .optional("network")
                .optional("gateway")
                .build()
                .unwrap(),
            ipv6: Descriptor::builder("ipv6", IPV6)
                .module("tcpip::ipv6::Stack")
                .input(ETHERNET)
                .package(Package::new("tcpip").min("8.0").max("10.0").sublib("ipv6"))
                .optional("gateway")
                .optional("handle_ra")
                .build()
                .unwrap(),
            dual: Descriptor::builder("dual_stack", DUAL_STACK_IP)
                .prefix("ip")
                .module("tcpip::ip::DualStack")
                .inputs([IPV4, IPV6])
                .package(Package::new("tcpip").min("8.0").max("9.0").sublib("ip"))
                .optional("ipv4_only")
                .optional("ipv6_only")
                .build()
                .unwrap(),
        }
    }

    fn compose(&self, run: &mut ConfigRun) -> Result<Node, ConfigError> {
        let l = run.apply(&self.link, vec![], Params::new())?;
        let a = run.apply(&self.arp, vec![l.clone()], Params::new())?;
        let v4 = run.apply(
            &self.ipv4,
            vec![l.clone(), a],
            Params::new().set("gateway", ParamValue::key("ipv4_gateway")),
        )?;
        let v6 = run.apply(&self.ipv6, vec![l], Params::new())?;
        run.apply(&self.dual, vec![v4, v6], Params::new())
    }

    fn build(&self) -> BuildOutput {
        let mut run = ConfigRun::new();
        let root = self.compose(&mut run).unwrap();
        build(&Graph::new(root)).unwrap()
    }
}

#[test]
fn dual_stack_scenario_emits_five_statements_in_order() {
    let output = Scenario::new().build();

    let texts: Vec<&str> = output.statements.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(
        texts,
        vec![
            "let ethernet_0 = ethernet::Ethernet::connect().await?;",
            "let arp_1 = arp::Arp::connect(&ethernet_0).await?;",
            "let ipv4_2 = tcpip::ipv4::Static::connect(&ethernet_0, &arp_1).gateway(runtime::key(\"ipv4_gateway\")).await?;",
            "let ipv6_3 = tcpip::ipv6::Stack::connect(&ethernet_0).await?;",
            "let ip_4 = tcpip::ip::DualStack::connect(&ipv4_2, &ipv6_3).await?;",
        ]
    );
    assert_eq!(output.entry, "ip_4");
    assert!(!output.statements[3].text.contains("handle_ra"));
    assert_eq!(output.packages["tcpip"].range.to_string(), ">=8.0, <9.0");
}

#[test]
fn every_dependency_is_bound_before_use() {
    let output = Scenario::new().build();
    for (i, stmt) in output.statements.iter().enumerate() {
        for later in &output.statements[i + 1..] {
            assert!(
                !stmt.text.contains(&format!("&{}", later.ident)),
                "{} references {} before it is bound",
                stmt.ident,
                later.ident
            );
        }
    }
}

#[test]
fn rerunning_the_pipeline_is_byte_identical() {
    let scenario = Scenario::new();
    assert_eq!(scenario.build(), scenario.build());
}

#[test]
fn conflicting_packages_abort_before_emission() {
    let scenario = Scenario::new();
    let legacy = Descriptor::builder("ipv6", IPV6)
        .module("legacy::Ipv6")
        .input(ETHERNET)
        .package(Package::new("tcpip").min("6.0").max("7.0"))
        .build()
        .unwrap();

    let mut run = ConfigRun::new();
    let l = run.apply(&scenario.link, vec![], Params::new()).unwrap();
    let a = run.apply(&scenario.arp, vec![l.clone()], Params::new()).unwrap();
    let v4 = run
        .apply(&scenario.ipv4, vec![l.clone(), a], Params::new())
        .unwrap();
    let v6 = run.apply(&legacy, vec![l], Params::new()).unwrap();
    let s = run.apply(&scenario.dual, vec![v4, v6], Params::new()).unwrap();

    match build(&Graph::new(s)) {
        Err(ConfigError::UnsatisfiableConstraint { package, .. }) => assert_eq!(package, "tcpip"),
        other => panic!("expected UnsatisfiableConstraint, got {:?}", other),
    }
}

#[test]
fn composition_file_matches_rust_composition() {
    let devices = Devices::standard().unwrap();
    let mut run = ConfigRun::new();
    let net = devices.tap(&mut run, Params::new()).unwrap();
    let eth = devices.ethernet(&mut run, &net).unwrap();
    let arp = devices.arp(&mut run, &eth).unwrap();
    let v4 = devices
        .ipv4_static(
            &mut run,
            &eth,
            &arp,
            Params::new().set("gateway", ParamValue::key("gateway")),
        )
        .unwrap();
    let v6 = devices
        .ipv6(
            &mut run,
            &net,
            &eth,
            Params::new().set("handle_ra", ParamValue::Flag(false)),
        )
        .unwrap();
    let ip = devices.dual_stack(&mut run, &v4, &v6, Params::new()).unwrap();
    let from_code = build(&Graph::new(ip.into_node())).unwrap();

    let spec = CompositionSpec::from_json(
        r#"{
            "nodes": [
                { "id": "net", "device": "tap" },
                { "id": "eth", "device": "ethernet", "deps": ["net"] },
                { "id": "arp", "device": "arp", "deps": ["eth"] },
                { "id": "v4", "device": "ipv4_static", "deps": ["eth", "arp"],
                  "params": { "gateway": { "key": "gateway" } } },
                { "id": "v6", "device": "ipv6", "deps": ["net", "eth"],
                  "params": { "handle_ra": false } },
                { "id": "stack", "device": "dual_stack", "deps": ["v4", "v6"] }
            ]
        }"#,
    )
    .unwrap();
    let composed = spec.validate_and_build(Catalog::standard().unwrap()).unwrap();
    let from_file = build(&composed.graph).unwrap();

    assert_eq!(from_file, from_code);
    assert_eq!(
        from_file.statements[4].text,
        "let ipv6_4 = tcpip::ipv6::Stack::connect(&net_0, &ethernet_1).handle_ra(false).await?;"
    );
}

#[test]
fn shipped_composition_builds() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/configs/dual_stack.json");
    let composed = CompositionSpec::load(path)
        .unwrap()
        .validate_and_build(Catalog::standard().unwrap())
        .unwrap();
    let output = build(&composed.graph).unwrap();
    assert_eq!(output.entry, composed.graph.root().ident());
    assert_eq!(output.statements.len(), composed.graph.len());
}

#[test]
fn nodes_from_another_run_cannot_be_composed() {
    let scenario = Scenario::new();
    let mut first = ConfigRun::new();
    let mut second = ConfigRun::new();
    let e = first.apply(&scenario.link, vec![], Params::new()).unwrap();
    let other = second.apply(&scenario.link, vec![], Params::new()).unwrap();
    let a = second.apply(&scenario.arp, vec![other], Params::new()).unwrap();

    match first.apply(&scenario.ipv4, vec![e, a], Params::new()) {
        Err(ConfigError::ForeignNode { node, index, dep }) => {
            assert_eq!((node.as_str(), index, dep.as_str()), ("ipv4_static", 1, "arp_1"));
        }
        other => panic!("expected ForeignNode, got {:?}", other),
    }
}
