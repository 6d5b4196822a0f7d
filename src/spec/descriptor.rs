//! Device descriptors: one implementation choice for a capability.
//!
//! A descriptor is checked once, when it is built. Everything downstream
//! (application, aggregation, emission) trusts these invariants:
//! - input count equals the arity declared by the emission
//! - every package range with both bounds has min < max
//! - optional slot names are pairwise distinct

use crate::error::ConfigError;
use crate::render::emit::{self, Call};
use crate::spec::{Capability, Package, VersionConstraint};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::{Arc, LazyLock};

static IDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z_][a-z0-9_]*$").expect("identifier pattern compiles"));

/// Renders one binding statement from a flattened call.
pub type EmitFn = fn(&Call<'_>) -> Result<String, ConfigError>;

/// How a node's initialization statement is produced.
#[derive(Clone, Copy)]
pub struct Emission {
    arity: usize,
    render: EmitFn,
}

impl Emission {
    /// `module::connect(deps..)` followed by one builder call per present
    /// optional parameter.
    pub fn connect(arity: usize) -> Self {
        Self {
            arity,
            render: emit::connect_call,
        }
    }

    pub fn custom(arity: usize, render: EmitFn) -> Self {
        Self { arity, render }
    }

    /// Number of required (positional) arguments.
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Custom renderers are not trusted to check the argument count.
    pub(crate) fn render(&self, call: &Call<'_>) -> Result<String, ConfigError> {
        call.check_arity()?;
        (self.render)(call)
    }
}

impl fmt::Debug for Emission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emission").field("arity", &self.arity).finish_non_exhaustive()
    }
}

#[derive(Debug)]
struct DescriptorData {
    name: String,
    prefix: String,
    module: String,
    output: Capability,
    inputs: Vec<Capability>,
    packages: Vec<VersionConstraint>,
    slots: Vec<String>,
    emission: Emission,
}

/// Immutable, cheaply cloneable handle to a validated descriptor.
#[derive(Debug, Clone)]
pub struct Descriptor(Arc<DescriptorData>);

impl Descriptor {
    pub fn builder(name: impl Into<String>, output: Capability) -> DescriptorBuilder {
        DescriptorBuilder {
            name: name.into(),
            prefix: None,
            module: None,
            output,
            inputs: Vec::new(),
            packages: Vec::new(),
            slots: Vec::new(),
            emission: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Stem of the identifiers generated for nodes of this descriptor.
    pub fn prefix(&self) -> &str {
        &self.0.prefix
    }

    /// Path the emitted initialization call goes through.
    pub fn module(&self) -> &str {
        &self.0.module
    }

    pub fn output(&self) -> &Capability {
        &self.0.output
    }

    pub fn inputs(&self) -> &[Capability] {
        &self.0.inputs
    }

    pub fn packages(&self) -> &[VersionConstraint] {
        &self.0.packages
    }

    /// Optional parameter slot names in declaration order.
    pub fn slots(&self) -> &[String] {
        &self.0.slots
    }

    pub fn emission(&self) -> &Emission {
        &self.0.emission
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inputs: Vec<&str> = self.inputs().iter().map(Capability::name).collect();
        write!(f, "{} : ({}) -> {}", self.name(), inputs.join(", "), self.output())
    }
}

#[derive(Debug)]
pub struct DescriptorBuilder {
    name: String,
    prefix: Option<String>,
    module: Option<String>,
    output: Capability,
    inputs: Vec<Capability>,
    packages: Vec<Package>,
    slots: Vec<String>,
    emission: Option<Emission>,
}

impl DescriptorBuilder {
    /// Defaults to the descriptor name.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Defaults to the descriptor name.
    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn input(mut self, capability: Capability) -> Self {
        self.inputs.push(capability);
        self
    }

    pub fn inputs(mut self, capabilities: impl IntoIterator<Item = Capability>) -> Self {
        self.inputs.extend(capabilities);
        self
    }

    pub fn package(mut self, package: Package) -> Self {
        self.packages.push(package);
        self
    }

    pub fn optional(mut self, slot: impl Into<String>) -> Self {
        self.slots.push(slot.into());
        self
    }

    /// Defaults to `Emission::connect` with one argument per input.
    pub fn emission(mut self, emission: Emission) -> Self {
        self.emission = Some(emission);
        self
    }

    pub fn build(self) -> Result<Descriptor, ConfigError> {
        let name = self.name;
        if !IDENT_RE.is_match(&name) {
            return Err(ConfigError::malformed(&name, "name must be a lowercase identifier"));
        }

        let prefix = self.prefix.unwrap_or_else(|| name.clone());
        if !IDENT_RE.is_match(&prefix) {
            return Err(ConfigError::malformed(
                &name,
                format!("prefix `{}` must be a lowercase identifier", prefix),
            ));
        }

        let emission = self
            .emission
            .unwrap_or_else(|| Emission::connect(self.inputs.len()));
        if emission.arity() != self.inputs.len() {
            return Err(ConfigError::malformed(
                &name,
                format!(
                    "{} required inputs but emission expects {}",
                    self.inputs.len(),
                    emission.arity()
                ),
            ));
        }

        let mut seen = BTreeSet::new();
        for slot in &self.slots {
            if !IDENT_RE.is_match(slot) {
                return Err(ConfigError::malformed(
                    &name,
                    format!("optional slot `{}` must be a lowercase identifier", slot),
                ));
            }
            if !seen.insert(slot.as_str()) {
                return Err(ConfigError::malformed(
                    &name,
                    format!("optional slot `{}` declared twice", slot),
                ));
            }
        }

        // Several declarations of the same package collapse into one range.
        let mut packages: BTreeMap<String, VersionConstraint> = BTreeMap::new();
        for package in &self.packages {
            if package.name.trim().is_empty() {
                return Err(ConfigError::malformed(&name, "package name is empty"));
            }
            let constraint = package.resolve().map_err(|e| {
                ConfigError::malformed(&name, format!("package `{}`: {}", package.name, e))
            })?;
            if constraint.range.is_empty() {
                return Err(ConfigError::malformed(
                    &name,
                    format!(
                        "package `{}` has an empty range {}",
                        package.name, constraint.range
                    ),
                ));
            }
            match packages.get_mut(&constraint.package) {
                Some(existing) => {
                    existing.range = existing.range.intersect(&constraint.range);
                    if existing.range.is_empty() {
                        return Err(ConfigError::malformed(
                            &name,
                            format!("package `{}` declared with disjoint ranges", package.name),
                        ));
                    }
                    existing.sublibs.extend(constraint.sublibs);
                    existing.sublibs.sort();
                    existing.sublibs.dedup();
                }
                None => {
                    packages.insert(constraint.package.clone(), constraint);
                }
            }
        }

        Ok(Descriptor(Arc::new(DescriptorData {
            module: self.module.unwrap_or_else(|| name.clone()),
            name,
            prefix,
            output: self.output,
            inputs: self.inputs,
            packages: packages.into_values().collect(),
            slots: self.slots,
            emission,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ParamValue;
    use crate::render::emit::Arg;
    use crate::spec::{ARP, ETHERNET, IPV4};
    use pretty_assertions::assert_eq;

    fn ignoring_emission(call: &Call<'_>) -> Result<String, ConfigError> {
        Ok(format!("let {} = x();", call.ident))
    }

    fn assert_malformed(result: Result<Descriptor, ConfigError>, needle: &str) {
        match result {
            Err(ConfigError::MalformedDescriptor { reason, .. }) => {
                assert!(reason.contains(needle), "unexpected reason: {}", reason)
            }
            other => panic!("expected MalformedDescriptor, got {:?}", other),
        }
    }

    #[test]
    fn builds_with_defaults() {
        let d = Descriptor::builder("ipv4_static", IPV4)
            .inputs([ETHERNET, ARP])
            .package(Package::new("tcpip").min("8.0").max("9.0"))
            .optional("gateway")
            .build()
            .unwrap();
        assert_eq!(d.prefix(), "ipv4_static");
        assert_eq!(d.module(), "ipv4_static");
        assert_eq!(d.emission().arity(), 2);
        assert_eq!(d.to_string(), "ipv4_static : (ethernet, arp) -> ipv4");
    }

    #[test]
    fn rejects_emission_arity_disagreeing_with_inputs() {
        let result = Descriptor::builder("arp", ARP)
            .input(ETHERNET)
            .emission(Emission::connect(2))
            .build();
        assert_malformed(result, "emission expects 2");
    }

    #[test]
    fn rejects_empty_version_range() {
        let result = Descriptor::builder("arp", ARP)
            .input(ETHERNET)
            .package(Package::new("arp").min("3.0").max("3.0"))
            .build();
        assert_malformed(result, "empty range");
    }

    #[test]
    fn rejects_unparsable_version() {
        let result = Descriptor::builder("arp", ARP)
            .package(Package::new("arp").min("three"))
            .build();
        assert_malformed(result, "invalid version");
    }

    #[test]
    fn rejects_duplicate_slots() {
        let result = Descriptor::builder("ipv4_static", IPV4)
            .optional("gateway")
            .optional("gateway")
            .build();
        assert_malformed(result, "declared twice");
    }

    #[test]
    fn merges_repeated_package_declarations() {
        let d = Descriptor::builder("stack", IPV4)
            .package(Package::new("tcpip").min("7.0").sublib("ipv4"))
            .package(Package::new("tcpip").max("9.0").sublib("icmpv4"))
            .build()
            .unwrap();
        assert_eq!(d.packages().len(), 1);
        assert_eq!(d.packages()[0].range.to_string(), ">=7.0, <9.0");
        assert_eq!(d.packages()[0].sublibs, vec!["icmpv4", "ipv4"]);
    }

    #[test]
    fn custom_emission_is_held_to_total_arity() {
        let emission = Emission::custom(0, ignoring_emission);
        let short = Call {
            node: "ethernet",
            ident: "ethernet_0",
            module: "ethernet",
            expected: 1,
            args: vec![],
        };
        assert_eq!(
            emission.render(&short).unwrap_err(),
            ConfigError::ArityMismatch {
                node: "ethernet".into(),
                expected: 1,
                observed: 0,
            }
        );

        let mtu = ParamValue::expr("1500");
        let full = Call {
            args: vec![Arg::Labeled {
                label: "mtu",
                value: &mtu,
            }],
            ..short
        };
        assert_eq!(emission.render(&full).unwrap(), "let ethernet_0 = x();");
    }
}
