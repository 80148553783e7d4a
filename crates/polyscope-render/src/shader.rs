//! Shader program composition from base templates and rules.
//!
//! A base template is a WGSL source containing `${ TAG }$` placeholders. A
//! [`ShaderRule`] declares the attributes, uniforms, varyings, and textures it
//! needs and supplies source fragments for some of those tags. A program
//! variant is a template plus an ordered list of rules, composed once into a
//! [`ComposedShader`] when it is registered with the [`ShaderLibrary`].
//!
//! Everything that can go wrong with a rule table is reported at registration:
//! duplicate names, unknown tags, undeclared `a_`/`u_`/`t_` symbols, and
//! declaration collisions inside a variant.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::sync::OnceLock;

use regex::Regex;

use crate::buffer::ShaderDataType;
use crate::error::ShaderRuleError;

/// Tags the composer fills from declarations; rules may not target them.
pub const GENERATED_TAGS: [&str; 4] = [
    "UNIFORM_FIELDS",
    "ATTRIBUTE_FIELDS",
    "VARYING_FIELDS",
    "TEXTURE_BINDINGS",
];

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{\s*([A-Z0-9_]+)\s*\}\$").expect("tag pattern is valid"))
}

fn symbol_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b[aut]_[A-Za-z0-9_]+\b").expect("symbol pattern is valid"))
}

/// A named, typed shader input or interstage value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderDecl {
    pub name: String,
    pub data_type: ShaderDataType,
}

impl ShaderDecl {
    pub fn new(name: impl Into<String>, data_type: ShaderDataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// A base WGSL template.
#[derive(Debug, Clone)]
pub struct ShaderTemplate {
    name: String,
    source: String,
    tags: Vec<String>,
    attributes: Vec<ShaderDecl>,
    uniforms: Vec<ShaderDecl>,
    textures: Vec<String>,
    first_varying_location: u32,
    vertices_per_instance: u32,
}

impl ShaderTemplate {
    /// Creates a template; its tags are read from `source`.
    pub fn new(name: impl Into<String>, source: impl Into<String>, vertices_per_instance: u32) -> Self {
        let source = source.into();
        let mut tags: Vec<String> = Vec::new();
        for caps in tag_pattern().captures_iter(&source) {
            let tag = caps[1].to_string();
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        Self {
            name: name.into(),
            source,
            tags,
            attributes: Vec::new(),
            uniforms: Vec::new(),
            textures: Vec::new(),
            first_varying_location: 0,
            vertices_per_instance,
        }
    }

    /// Declares a per-instance attribute consumed by the template itself.
    #[must_use]
    pub fn attribute(mut self, name: &str, data_type: ShaderDataType) -> Self {
        self.attributes.push(ShaderDecl::new(name, data_type));
        self
    }

    /// Declares a uniform consumed by the template itself.
    #[must_use]
    pub fn uniform(mut self, name: &str, data_type: ShaderDataType) -> Self {
        self.uniforms.push(ShaderDecl::new(name, data_type));
        self
    }

    /// First `@location` free for rule varyings.
    #[must_use]
    pub fn varyings_from(mut self, location: u32) -> Self {
        self.first_varying_location = location;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Placeholder tags found in the source, in order of first appearance.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn offers_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    fn declares(&self, symbol: &str) -> bool {
        self.attributes.iter().any(|d| d.name == symbol)
            || self.uniforms.iter().any(|d| d.name == symbol)
            || self.textures.iter().any(|t| t == symbol)
    }
}

/// A composable fragment of shader behavior.
#[derive(Debug, Clone, Default)]
pub struct ShaderRule {
    name: String,
    attributes: Vec<ShaderDecl>,
    varyings: Vec<ShaderDecl>,
    uniforms: Vec<ShaderDecl>,
    textures: Vec<String>,
    sources: Vec<(String, String)>,
}

impl ShaderRule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn attribute(mut self, name: &str, data_type: ShaderDataType) -> Self {
        self.attributes.push(ShaderDecl::new(name, data_type));
        self
    }

    #[must_use]
    pub fn varying(mut self, name: &str, data_type: ShaderDataType) -> Self {
        self.varyings.push(ShaderDecl::new(name, data_type));
        self
    }

    #[must_use]
    pub fn uniform(mut self, name: &str, data_type: ShaderDataType) -> Self {
        self.uniforms.push(ShaderDecl::new(name, data_type));
        self
    }

    /// Declares a 2D texture; a matching `s_` sampler is generated alongside it.
    #[must_use]
    pub fn texture(mut self, name: &str) -> Self {
        self.textures.push(name.to_string());
        self
    }

    /// Adds source text for a template tag.
    #[must_use]
    pub fn source(mut self, tag: &str, text: &str) -> Self {
        self.sources.push((tag.to_string(), text.to_string()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn declares(&self, symbol: &str) -> bool {
        self.attributes.iter().any(|d| d.name == symbol)
            || self.uniforms.iter().any(|d| d.name == symbol)
            || self.textures.iter().any(|t| t == symbol)
    }

    fn referenced_symbols(&self) -> impl Iterator<Item = &str> {
        self.sources
            .iter()
            .flat_map(|(_, text)| symbol_pattern().find_iter(text).map(|m| m.as_str()))
    }

    fn declared_names(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .iter()
            .chain(&self.uniforms)
            .chain(&self.varyings)
            .map(|d| d.name.as_str())
            .chain(self.textures.iter().map(String::as_str))
    }
}

/// Rules appended automatically depending on what a program is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacementDefaults {
    /// Lit geometry drawn into the scene.
    SceneObject,
    /// Flat color output for the pick buffer.
    Pick,
    /// Nothing appended.
    Process,
}

impl ReplacementDefaults {
    pub fn rules(self) -> &'static [&'static str] {
        match self {
            Self::SceneObject => &["LIGHT_MATCAP"],
            Self::Pick => &["LIGHT_PASSTHRU"],
            Self::Process => &[],
        }
    }
}

/// A fully composed program variant, ready to hand to a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedShader {
    label: String,
    template: String,
    rules: Vec<String>,
    source: String,
    attributes: Vec<ShaderDecl>,
    uniforms: Vec<ShaderDecl>,
    varyings: Vec<ShaderDecl>,
    textures: Vec<String>,
    vertices_per_instance: u32,
}

impl ComposedShader {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Applied rules in order, defaults included.
    pub fn rules(&self) -> &[String] {
        &self.rules
    }

    /// Final WGSL text.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn attributes(&self) -> &[ShaderDecl] {
        &self.attributes
    }

    pub fn uniforms(&self) -> &[ShaderDecl] {
        &self.uniforms
    }

    pub fn varyings(&self) -> &[ShaderDecl] {
        &self.varyings
    }

    pub fn textures(&self) -> &[String] {
        &self.textures
    }

    pub fn vertices_per_instance(&self) -> u32 {
        self.vertices_per_instance
    }

    pub fn attribute(&self, name: &str) -> Option<&ShaderDecl> {
        self.attributes.iter().find(|d| d.name == name)
    }

    pub fn uniform(&self, name: &str) -> Option<&ShaderDecl> {
        self.uniforms.iter().find(|d| d.name == name)
    }

    pub fn has_texture(&self, name: &str) -> bool {
        self.textures.iter().any(|t| t == name)
    }
}

/// Registered templates, rules, and composed program variants.
#[derive(Debug, Default)]
pub struct ShaderLibrary {
    templates: HashMap<String, ShaderTemplate>,
    rules: HashMap<String, ShaderRule>,
    variants: HashMap<String, ComposedShader>,
}

impl ShaderLibrary {
    /// Creates an empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a base template.
    pub fn register_template(&mut self, template: ShaderTemplate) -> Result<(), ShaderRuleError> {
        if self.templates.contains_key(template.name()) {
            return Err(ShaderRuleError::DuplicateTemplate(template.name().to_string()));
        }
        log::debug!(
            "registered shader template '{}' with tags {:?}",
            template.name(),
            template.tags()
        );
        self.templates.insert(template.name().to_string(), template);
        Ok(())
    }

    /// Registers a rule.
    ///
    /// Templates must be registered first: tags and symbols are checked
    /// against everything the registered templates offer.
    pub fn register_rule(&mut self, rule: ShaderRule) -> Result<(), ShaderRuleError> {
        if self.rules.contains_key(rule.name()) {
            return Err(ShaderRuleError::DuplicateRule(rule.name().to_string()));
        }

        for (tag, _) in &rule.sources {
            if GENERATED_TAGS.contains(&tag.as_str()) {
                return Err(ShaderRuleError::ReservedTag {
                    rule: rule.name.clone(),
                    tag: tag.clone(),
                });
            }
            if !self.templates.values().any(|t| t.offers_tag(tag)) {
                return Err(ShaderRuleError::UnknownTag {
                    rule: rule.name.clone(),
                    tag: tag.clone(),
                });
            }
        }

        for symbol in rule.referenced_symbols() {
            let declared =
                rule.declares(symbol) || self.templates.values().any(|t| t.declares(symbol));
            if !declared {
                return Err(ShaderRuleError::UndeclaredSymbol {
                    rule: rule.name.clone(),
                    symbol: symbol.to_string(),
                });
            }
        }

        self.rules.insert(rule.name().to_string(), rule);
        Ok(())
    }

    /// Composes and stores a program variant under `label`.
    pub fn register_variant(
        &mut self,
        label: &str,
        template: &str,
        rules: &[&str],
        defaults: ReplacementDefaults,
    ) -> Result<(), ShaderRuleError> {
        if self.variants.contains_key(label) {
            return Err(ShaderRuleError::DuplicateVariant(label.to_string()));
        }
        let composed = self.compose(label, template, rules, defaults)?;
        log::debug!("registered program variant '{label}' ({:?})", composed.rules());
        self.variants.insert(label.to_string(), composed);
        Ok(())
    }

    /// Looks up a registered variant.
    pub fn variant(&self, label: &str) -> Option<&ComposedShader> {
        self.variants.get(label)
    }

    /// Number of registered variants.
    pub fn variant_count(&self) -> usize {
        self.variants.len()
    }

    /// Composes a variant without storing it.
    pub fn compose(
        &self,
        label: &str,
        template_name: &str,
        rule_names: &[&str],
        defaults: ReplacementDefaults,
    ) -> Result<ComposedShader, ShaderRuleError> {
        let template = self
            .templates
            .get(template_name)
            .ok_or_else(|| ShaderRuleError::UnknownTemplate(template_name.to_string()))?;

        let mut rules: Vec<&ShaderRule> = Vec::new();
        for name in rule_names.iter().chain(defaults.rules()) {
            let rule = self
                .rules
                .get(*name)
                .ok_or_else(|| ShaderRuleError::UnknownRule((*name).to_string()))?;
            rules.push(rule);
        }

        // every declaration in a variant must be unique
        let mut declared: HashSet<&str> = HashSet::new();
        let base_names = template
            .attributes
            .iter()
            .chain(&template.uniforms)
            .map(|d| d.name.as_str())
            .chain(template.textures.iter().map(String::as_str));
        for name in base_names.chain(rules.iter().flat_map(|r| r.declared_names())) {
            if !declared.insert(name) {
                return Err(ShaderRuleError::DeclarationCollision {
                    variant: label.to_string(),
                    symbol: name.to_string(),
                });
            }
        }

        for rule in &rules {
            for (tag, _) in &rule.sources {
                if !template.offers_tag(tag) {
                    return Err(ShaderRuleError::TagNotOffered {
                        variant: label.to_string(),
                        rule: rule.name.clone(),
                        tag: tag.clone(),
                    });
                }
            }
            for symbol in rule.referenced_symbols() {
                if !declared.contains(symbol) {
                    return Err(ShaderRuleError::UndeclaredSymbol {
                        rule: rule.name.clone(),
                        symbol: symbol.to_string(),
                    });
                }
            }
        }

        let attributes: Vec<ShaderDecl> = template
            .attributes
            .iter()
            .chain(rules.iter().flat_map(|r| &r.attributes))
            .cloned()
            .collect();
        let uniforms: Vec<ShaderDecl> = template
            .uniforms
            .iter()
            .chain(rules.iter().flat_map(|r| &r.uniforms))
            .cloned()
            .collect();
        let varyings: Vec<ShaderDecl> = rules.iter().flat_map(|r| &r.varyings).cloned().collect();
        let textures: Vec<String> = template
            .textures
            .iter()
            .chain(rules.iter().flat_map(|r| &r.textures))
            .cloned()
            .collect();

        let mut replacements: HashMap<String, String> = HashMap::new();
        replacements.insert("UNIFORM_FIELDS".into(), uniform_fields(&uniforms));
        replacements.insert("ATTRIBUTE_FIELDS".into(), attribute_fields(&attributes));
        replacements.insert(
            "VARYING_FIELDS".into(),
            varying_fields(&varyings, template.first_varying_location),
        );
        replacements.insert("TEXTURE_BINDINGS".into(), texture_bindings(&textures));
        for rule in &rules {
            for (tag, text) in &rule.sources {
                let entry = replacements.entry(tag.clone()).or_default();
                entry.push_str(text);
                if !text.ends_with('\n') {
                    entry.push('\n');
                }
            }
        }

        let source = tag_pattern()
            .replace_all(&template.source, |caps: &regex::Captures<'_>| {
                replacements.get(&caps[1]).cloned().unwrap_or_default()
            })
            .into_owned();

        Ok(ComposedShader {
            label: label.to_string(),
            template: template.name.clone(),
            rules: rules.iter().map(|r| r.name.clone()).collect(),
            source,
            attributes,
            uniforms,
            varyings,
            textures,
            vertices_per_instance: template.vertices_per_instance,
        })
    }
}

fn uniform_fields(decls: &[ShaderDecl]) -> String {
    let mut out = String::new();
    for d in decls {
        let _ = writeln!(out, "    {}: {},", d.name, d.data_type.wgsl_name());
    }
    out
}

fn attribute_fields(decls: &[ShaderDecl]) -> String {
    let mut out = String::new();
    for (location, d) in decls.iter().enumerate() {
        let _ = writeln!(
            out,
            "    @location({location}) {}: {},",
            d.name,
            d.data_type.wgsl_name()
        );
    }
    out
}

fn varying_fields(decls: &[ShaderDecl], first_location: u32) -> String {
    let mut out = String::new();
    for (location, d) in (first_location..).zip(decls) {
        let _ = writeln!(
            out,
            "    @location({location}) @interpolate(flat) {}: {},",
            d.name,
            d.data_type.wgsl_name()
        );
    }
    out
}

fn texture_bindings(textures: &[String]) -> String {
    let mut out = String::new();
    for (slot, name) in (0_u32..).zip(textures) {
        let sampler = format!("s_{}", name.trim_start_matches("t_"));
        let _ = writeln!(
            out,
            "@group(1) @binding({}) var {name}: texture_2d<f32>;",
            2 * slot
        );
        let _ = writeln!(
            out,
            "@group(1) @binding({}) var {sampler}: sampler;",
            2 * slot + 1
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = "struct U {\n${ UNIFORM_FIELDS }$};\n${ TEXTURE_BINDINGS }$\nstruct A {\n${ ATTRIBUTE_FIELDS }$};\nstruct V {\n${ VARYING_FIELDS }$};\nfn f() {\n${ BODY }$}\n";

    fn library() -> ShaderLibrary {
        let mut lib = ShaderLibrary::new();
        lib.register_template(
            ShaderTemplate::new("BASE", TEMPLATE, 3)
                .attribute("a_position", ShaderDataType::Vec3)
                .uniform("u_modelView", ShaderDataType::Mat4)
                .varyings_from(2),
        )
        .unwrap();
        lib.register_template(ShaderTemplate::new("OTHER", "${ OTHER_BODY }$", 6))
            .unwrap();
        lib
    }

    #[test]
    fn test_template_tags_are_parsed() {
        let lib = library();
        let base = &lib.templates["BASE"];
        assert_eq!(
            base.tags(),
            &["UNIFORM_FIELDS", "TEXTURE_BINDINGS", "ATTRIBUTE_FIELDS", "VARYING_FIELDS", "BODY"]
        );
    }

    #[test]
    fn test_compose_generates_declarations() {
        let mut lib = library();
        lib.register_rule(
            ShaderRule::new("VALUE")
                .attribute("a_value", ShaderDataType::Float)
                .varying("v_value", ShaderDataType::Float)
                .uniform("u_scale", ShaderDataType::Float)
                .texture("t_colormap")
                .source("BODY", "let x = a_value * u_scale;"),
        )
        .unwrap();
        lib.register_variant("v", "BASE", &["VALUE"], ReplacementDefaults::Process)
            .unwrap();

        let shader = lib.variant("v").unwrap();
        let src = shader.source();
        assert!(src.contains("    u_modelView: mat4x4<f32>,\n    u_scale: f32,"));
        assert!(src.contains("@location(0) a_position: vec3<f32>,"));
        assert!(src.contains("@location(1) a_value: f32,"));
        assert!(src.contains("@location(2) @interpolate(flat) v_value: f32,"));
        assert!(src.contains("@group(1) @binding(0) var t_colormap: texture_2d<f32>;"));
        assert!(src.contains("@group(1) @binding(1) var s_colormap: sampler;"));
        assert!(src.contains("let x = a_value * u_scale;"));
        assert!(!src.contains("${"));
        assert_eq!(shader.vertices_per_instance(), 3);
        assert_eq!(shader.rules(), &["VALUE".to_string()]);
    }

    #[test]
    fn test_fragments_concatenate_in_rule_order() {
        let mut lib = library();
        lib.register_rule(ShaderRule::new("FIRST").source("BODY", "first();"))
            .unwrap();
        lib.register_rule(ShaderRule::new("SECOND").source("BODY", "second();"))
            .unwrap();
        let shader = lib
            .compose("v", "BASE", &["SECOND", "FIRST"], ReplacementDefaults::Process)
            .unwrap();
        let second = shader.source().find("second();").unwrap();
        let first = shader.source().find("first();").unwrap();
        assert!(second < first);
    }

    #[test]
    fn test_registration_errors() {
        let mut lib = library();
        lib.register_rule(ShaderRule::new("R")).unwrap();

        assert_eq!(
            lib.register_rule(ShaderRule::new("R")),
            Err(ShaderRuleError::DuplicateRule("R".into()))
        );
        assert!(matches!(
            lib.register_rule(ShaderRule::new("BAD_TAG").source("NOPE", "")),
            Err(ShaderRuleError::UnknownTag { tag, .. }) if tag == "NOPE"
        ));
        assert!(matches!(
            lib.register_rule(ShaderRule::new("RESERVED").source("UNIFORM_FIELDS", "")),
            Err(ShaderRuleError::ReservedTag { .. })
        ));
        assert!(matches!(
            lib.register_rule(ShaderRule::new("UNDECLARED").source("BODY", "let y = u_missing;")),
            Err(ShaderRuleError::UndeclaredSymbol { symbol, .. }) if symbol == "u_missing"
        ));
        // symbols declared by a template are fine
        lib.register_rule(ShaderRule::new("USES_BASE").source("BODY", "let m = u_modelView;"))
            .unwrap();
    }

    #[test]
    fn test_variant_errors() {
        let mut lib = library();
        lib.register_rule(ShaderRule::new("DUP").uniform("u_modelView", ShaderDataType::Mat4))
            .unwrap();
        lib.register_rule(ShaderRule::new("BODY_ONLY").source("BODY", "x();"))
            .unwrap();

        assert!(matches!(
            lib.compose("v", "BASE", &["DUP"], ReplacementDefaults::Process),
            Err(ShaderRuleError::DeclarationCollision { symbol, .. }) if symbol == "u_modelView"
        ));
        assert!(matches!(
            lib.compose("v", "OTHER", &["BODY_ONLY"], ReplacementDefaults::Process),
            Err(ShaderRuleError::TagNotOffered { tag, .. }) if tag == "BODY"
        ));
        assert!(matches!(
            lib.compose("v", "BASE", &["MISSING"], ReplacementDefaults::Process),
            Err(ShaderRuleError::UnknownRule(_))
        ));
        assert!(matches!(
            lib.compose("v", "NOPE", &[], ReplacementDefaults::Process),
            Err(ShaderRuleError::UnknownTemplate(_))
        ));
        // defaults name rules that are not registered in this library
        assert!(matches!(
            lib.compose("v", "BASE", &[], ReplacementDefaults::Pick),
            Err(ShaderRuleError::UnknownRule(name)) if name == "LIGHT_PASSTHRU"
        ));
    }

    #[test]
    fn test_duplicate_variant() {
        let mut lib = library();
        lib.register_variant("v", "BASE", &[], ReplacementDefaults::Process)
            .unwrap();
        assert_eq!(
            lib.register_variant("v", "BASE", &[], ReplacementDefaults::Process),
            Err(ShaderRuleError::DuplicateVariant("v".into()))
        );
        assert_eq!(lib.variant_count(), 1);
    }
}
