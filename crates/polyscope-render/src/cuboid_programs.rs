//! Built-in templates, rules, and program variants for cuboid networks.

use crate::buffer::ShaderDataType;
use crate::error::{RenderError, RenderResult, ShaderRuleError};
use crate::shader::{ComposedShader, ReplacementDefaults, ShaderLibrary, ShaderRule, ShaderTemplate};

/// Fraction of an edge, at each end, whose pick fragments report the adjacent node.
pub const PICK_END_FRACTION: f32 = 0.2;

const COMMON_WGSL: &str = include_str!("shaders/common.wgsl");
const CUBOID_WGSL: &str = include_str!("shaders/cuboid.wgsl");
const RAYCAST_SPHERE_WGSL: &str = include_str!("shaders/raycast_sphere.wgsl");
const VECTOR_ARROW_WGSL: &str = include_str!("shaders/vector_arrow.wgsl");

const DEPTH_RULE: &str = "CUBOID_WRITE_DEPTH";

/// Every program a cuboid network or one of its quantities can draw with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramVariant {
    /// Network drawn in its base color.
    BaseColor,
    /// One scalar per edge.
    EdgeScalar,
    /// Scalars on nodes, blended along each edge.
    NodeScalar,
    /// One color per edge.
    EdgeColor,
    /// Colors on nodes, blended along each edge.
    NodeColor,
    /// Edge boxes in the pick buffer.
    EdgePick,
    /// Node spheres in the pick buffer.
    NodePick,
    /// Vector glyphs.
    VectorArrow,
}

impl ProgramVariant {
    pub const ALL: [ProgramVariant; 8] = [
        Self::BaseColor,
        Self::EdgeScalar,
        Self::NodeScalar,
        Self::EdgeColor,
        Self::NodeColor,
        Self::EdgePick,
        Self::NodePick,
        Self::VectorArrow,
    ];

    fn name(self) -> &'static str {
        match self {
            Self::BaseColor => "base_color",
            Self::EdgeScalar => "edge_scalar",
            Self::NodeScalar => "node_scalar",
            Self::EdgeColor => "edge_color",
            Self::NodeColor => "node_color",
            Self::EdgePick => "edge_pick",
            Self::NodePick => "node_pick",
            Self::VectorArrow => "vector_arrow",
        }
    }

    /// Registry label, e.g. `cuboid/edge_scalar` or `cuboid/edge_scalar/no_depth`.
    pub fn label(self, depth_write: bool) -> String {
        if depth_write {
            format!("cuboid/{}", self.name())
        } else {
            format!("cuboid/{}/no_depth", self.name())
        }
    }

    pub fn template(self) -> &'static str {
        match self {
            Self::NodePick => "RAYCAST_SPHERE",
            Self::VectorArrow => "VECTOR_ARROW",
            _ => "CUBOID",
        }
    }

    pub fn rules(self) -> &'static [&'static str] {
        match self {
            Self::BaseColor | Self::VectorArrow => &["SHADE_BASECOLOR"],
            Self::EdgeScalar => &["CUBOID_PROPAGATE_VALUE", "SHADE_COLORMAP_VALUE"],
            Self::NodeScalar => &["CUBOID_PROPAGATE_BLEND_VALUE", "SHADE_COLORMAP_VALUE"],
            Self::EdgeColor => &["CUBOID_PROPAGATE_COLOR"],
            Self::NodeColor => &["CUBOID_PROPAGATE_BLEND_COLOR"],
            Self::EdgePick => &["CUBOID_PROPAGATE_PICK"],
            Self::NodePick => &["SPHERE_PROPAGATE_COLOR"],
        }
    }

    pub fn defaults(self) -> ReplacementDefaults {
        match self {
            Self::EdgePick | Self::NodePick => ReplacementDefaults::Pick,
            _ => ReplacementDefaults::SceneObject,
        }
    }
}

fn with_view_uniforms(template: ShaderTemplate) -> ShaderTemplate {
    template
        .uniform("u_modelView", ShaderDataType::Mat4)
        .uniform("u_projMatrix", ShaderDataType::Mat4)
        .uniform("u_invProjMatrix", ShaderDataType::Mat4)
        .uniform("u_viewport", ShaderDataType::Vec4)
}

fn builtin_templates() -> Vec<ShaderTemplate> {
    vec![
        with_view_uniforms(ShaderTemplate::new(
            "CUBOID",
            format!("{COMMON_WGSL}\n{CUBOID_WGSL}"),
            36,
        ))
        .attribute("a_position_tail", ShaderDataType::Vec3)
        .attribute("a_position_tip", ShaderDataType::Vec3)
        .attribute("a_up_direction", ShaderDataType::Vec3)
        .uniform("u_wn", ShaderDataType::Float)
        .uniform("u_wb", ShaderDataType::Float)
        .varyings_from(3),
        with_view_uniforms(ShaderTemplate::new(
            "RAYCAST_SPHERE",
            format!("{COMMON_WGSL}\n{RAYCAST_SPHERE_WGSL}"),
            6,
        ))
        .attribute("a_position", ShaderDataType::Vec3)
        .uniform("u_pointRadius", ShaderDataType::Float)
        .varyings_from(1),
        with_view_uniforms(ShaderTemplate::new(
            "VECTOR_ARROW",
            format!("{COMMON_WGSL}\n{VECTOR_ARROW_WGSL}"),
            36,
        ))
        .attribute("a_vector_root", ShaderDataType::Vec3)
        .attribute("a_vector", ShaderDataType::Vec3)
        .uniform("u_radius", ShaderDataType::Float)
        .uniform("u_lengthMult", ShaderDataType::Float)
        .varyings_from(2),
    ]
}

fn builtin_rules() -> Vec<ShaderRule> {
    use ShaderDataType::{Float, Vec3};

    let pick_select = format!(
        "    albedo = input.v_pick_edge;\n    if (edge_param < {lo:?}) {{\n        albedo = input.v_pick_tail;\n    }} else if (edge_param >= {hi:?}) {{\n        albedo = input.v_pick_tip;\n    }}\n",
        lo = PICK_END_FRACTION,
        hi = 1.0 - PICK_END_FRACTION,
    );

    vec![
        ShaderRule::new("SHADE_BASECOLOR")
            .uniform("u_baseColor", Vec3)
            .source("GENERATE_SHADE_COLOR", "    albedo = u.u_baseColor;"),
        ShaderRule::new("SHADE_COLORMAP_VALUE")
            .uniform("u_rangeLow", Float)
            .uniform("u_rangeHigh", Float)
            .texture("t_colormap")
            .source(
                "GENERATE_SHADE_COLOR",
                "    let colormap_coord = clamp((shade_value - u.u_rangeLow) / max(u.u_rangeHigh - u.u_rangeLow, 1e-12), 0.0, 1.0);\n    albedo = textureSampleLevel(t_colormap, s_colormap, vec2<f32>(colormap_coord, 0.5), 0.0).rgb;",
            ),
        ShaderRule::new("CUBOID_PROPAGATE_VALUE")
            .attribute("a_value", Float)
            .varying("v_value", Float)
            .source("VERT_ASSIGN", "    out.v_value = attrs.a_value;")
            .source("GENERATE_SHADE_VALUE", "    shade_value = input.v_value;"),
        ShaderRule::new("CUBOID_PROPAGATE_BLEND_VALUE")
            .attribute("a_value_tail", Float)
            .attribute("a_value_tip", Float)
            .varying("v_value_tail", Float)
            .varying("v_value_tip", Float)
            .source(
                "VERT_ASSIGN",
                "    out.v_value_tail = attrs.a_value_tail;\n    out.v_value_tip = attrs.a_value_tip;",
            )
            .source(
                "GENERATE_SHADE_VALUE",
                "    shade_value = mix(input.v_value_tail, input.v_value_tip, edge_param);",
            ),
        ShaderRule::new("CUBOID_PROPAGATE_COLOR")
            .attribute("a_color", Vec3)
            .varying("v_color", Vec3)
            .source("VERT_ASSIGN", "    out.v_color = attrs.a_color;")
            .source("GENERATE_SHADE_COLOR", "    albedo = input.v_color;"),
        ShaderRule::new("CUBOID_PROPAGATE_BLEND_COLOR")
            .attribute("a_color_tail", Vec3)
            .attribute("a_color_tip", Vec3)
            .varying("v_color_tail", Vec3)
            .varying("v_color_tip", Vec3)
            .source(
                "VERT_ASSIGN",
                "    out.v_color_tail = attrs.a_color_tail;\n    out.v_color_tip = attrs.a_color_tip;",
            )
            .source(
                "GENERATE_SHADE_COLOR",
                "    albedo = mix(input.v_color_tail, input.v_color_tip, edge_param);",
            ),
        ShaderRule::new("CUBOID_PROPAGATE_PICK")
            .attribute("a_color_tail", Vec3)
            .attribute("a_color_tip", Vec3)
            .attribute("a_color_edge", Vec3)
            .varying("v_pick_tail", Vec3)
            .varying("v_pick_tip", Vec3)
            .varying("v_pick_edge", Vec3)
            .source(
                "VERT_ASSIGN",
                "    out.v_pick_tail = attrs.a_color_tail;\n    out.v_pick_tip = attrs.a_color_tip;\n    out.v_pick_edge = attrs.a_color_edge;",
            )
            .source("GENERATE_SHADE_COLOR", &pick_select),
        ShaderRule::new("SPHERE_PROPAGATE_COLOR")
            .attribute("a_color", Vec3)
            .varying("v_color", Vec3)
            .source("VERT_ASSIGN", "    out.v_color = attrs.a_color;")
            .source("GENERATE_SHADE_COLOR", "    albedo = input.v_color;"),
        ShaderRule::new("LIGHT_MATCAP")
            .texture("t_matcap")
            .source(
                "GENERATE_LIT_COLOR",
                "    let matcap_coord = normal.xy * 0.5 + vec2<f32>(0.5, 0.5);\n    lit_color = albedo * textureSampleLevel(t_matcap, s_matcap, vec2<f32>(matcap_coord.x, 1.0 - matcap_coord.y), 0.0).rgb;",
            ),
        ShaderRule::new("LIGHT_PASSTHRU").source("GENERATE_LIT_COLOR", "    lit_color = albedo;"),
        ShaderRule::new(DEPTH_RULE)
            .source("FRAG_OUTPUT_FIELDS", "    @builtin(frag_depth) depth: f32,")
            .source(
                "FRAG_WRITE_DEPTH",
                "    let hit_clip = u.u_projMatrix * vec4<f32>(hit_pos, 1.0);\n    out.depth = hit_clip.z / hit_clip.w;",
            ),
    ]
}

impl ShaderLibrary {
    /// A library with every cuboid network program variant registered,
    /// each in a depth-writing and a non-depth-writing form.
    pub fn with_builtin_programs() -> Result<Self, ShaderRuleError> {
        let mut library = Self::new();
        for template in builtin_templates() {
            library.register_template(template)?;
        }
        for rule in builtin_rules() {
            library.register_rule(rule)?;
        }
        for variant in ProgramVariant::ALL {
            for depth_write in [true, false] {
                let mut rules: Vec<&str> = variant.rules().to_vec();
                if depth_write {
                    rules.push(DEPTH_RULE);
                }
                library.register_variant(
                    &variant.label(depth_write),
                    variant.template(),
                    &rules,
                    variant.defaults(),
                )?;
            }
        }
        Ok(library)
    }

    /// Looks up a built-in program variant.
    pub fn program(&self, variant: ProgramVariant, depth_write: bool) -> RenderResult<&ComposedShader> {
        let label = variant.label(depth_write);
        self.variant(&label)
            .ok_or(RenderError::UnknownProgram(label))
    }
}
