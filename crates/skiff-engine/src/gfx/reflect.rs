//! WGSL binding reflection.
//!
//! The device learns a shader's resource interface from the source text:
//! `@group(G) @binding(B)` declarations classified by address space or type,
//! plus the `@vertex` / `@fragment` / `@compute` entry point names. The scan
//! is textual and comment-tolerant; it does not validate WGSL (the native
//! compiler does that), it only recovers the binding shape.

/// What a `@group/@binding` declaration binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BindingClass {
    Uniform,
    Texture,
    Sampler,
    /// Storage buffers and storage textures; declared but not bindable
    /// through this device.
    Storage,
    /// Anything the scan could not classify.
    Unknown,
}

/// One reflected resource declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BindingDecl {
    pub group: u32,
    pub binding: u32,
    pub class: BindingClass,
    pub name: String,
}

/// Reflection result for one shader source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ShaderReflection {
    pub bindings: Vec<BindingDecl>,
    pub vertex_entry: Option<String>,
    pub fragment_entry: Option<String>,
    pub compute_entry: Option<String>,
}

pub(crate) fn reflect_wgsl(source: &str) -> ShaderReflection {
    let clean = strip_comments(source);
    let mut scan = Scanner::new(clean.as_bytes());
    let mut out = ShaderReflection::default();

    loop {
        scan.seek_to(b'@');
        if scan.at_end() {
            break;
        }

        let attrs = parse_attr_seq(&mut scan);
        scan.skip_ws();

        if scan.eat_keyword("var") {
            if let (Some(group), Some(binding)) = (attrs.group, attrs.binding) {
                if let Some((class, name)) = parse_var_decl(&mut scan) {
                    out.bindings.push(BindingDecl {
                        group,
                        binding,
                        class,
                        name,
                    });
                }
            }
        } else if scan.eat_keyword("fn") {
            scan.skip_ws();
            if let (Some(stage), Some(name)) = (attrs.stage, scan.eat_ident()) {
                let slot = match stage {
                    Stage::Vertex => &mut out.vertex_entry,
                    Stage::Fragment => &mut out.fragment_entry,
                    Stage::Compute => &mut out.compute_entry,
                };
                // First declaration per stage wins.
                if slot.is_none() {
                    *slot = Some(name);
                }
            }
        }
    }

    out
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    Vertex,
    Fragment,
    Compute,
}

#[derive(Default)]
struct AttrSeq {
    group: Option<u32>,
    binding: Option<u32>,
    stage: Option<Stage>,
}

/// Consumes a run of `@name` / `@name(args)` attributes in any order.
fn parse_attr_seq(scan: &mut Scanner<'_>) -> AttrSeq {
    let mut attrs = AttrSeq::default();

    loop {
        scan.skip_ws();
        if !scan.eat_byte(b'@') {
            break;
        }
        let Some(name) = scan.eat_ident() else {
            break;
        };

        match name.as_str() {
            "group" => attrs.group = scan.eat_paren_u32(),
            "binding" => attrs.binding = scan.eat_paren_u32(),
            "vertex" => attrs.stage = Some(Stage::Vertex),
            "fragment" => attrs.stage = Some(Stage::Fragment),
            "compute" => attrs.stage = Some(Stage::Compute),
            _ => {
                scan.skip_ws();
                scan.skip_balanced_parens();
            }
        }
    }

    attrs
}

/// Parses the remainder of `var<space> name : type` after the `var` keyword.
fn parse_var_decl(scan: &mut Scanner<'_>) -> Option<(BindingClass, String)> {
    scan.skip_ws();

    let mut address_space = None;
    if scan.eat_byte(b'<') {
        address_space = scan.eat_ident();
        scan.seek_past(b'>');
    }

    scan.skip_ws();
    let name = scan.eat_ident()?;
    scan.skip_ws();
    if !scan.eat_byte(b':') {
        return None;
    }
    scan.skip_ws();
    let ty = scan.eat_ident()?;

    let class = match address_space.as_deref() {
        Some("uniform") => BindingClass::Uniform,
        Some("storage") => BindingClass::Storage,
        _ if ty.starts_with("texture_storage") => BindingClass::Storage,
        _ if ty.starts_with("texture") => BindingClass::Texture,
        _ if ty.starts_with("sampler") => BindingClass::Sampler,
        _ => BindingClass::Unknown,
    };

    Some((class, name))
}

/// Removes `//` line comments and (nested) `/* */` block comments.
///
/// Comment delimiters are ASCII, so byte-wise removal cannot split a UTF-8
/// sequence that survives into the output.
fn strip_comments(source: &str) -> String {
    let b = source.as_bytes();
    let mut out = Vec::with_capacity(b.len());
    let mut i = 0;

    while i < b.len() {
        if b[i] == b'/' && i + 1 < b.len() && b[i + 1] == b'/' {
            while i < b.len() && b[i] != b'\n' {
                i += 1;
            }
        } else if b[i] == b'/' && i + 1 < b.len() && b[i + 1] == b'*' {
            let mut depth = 1u32;
            i += 2;
            while i < b.len() && depth > 0 {
                if b[i] == b'/' && i + 1 < b.len() && b[i + 1] == b'*' {
                    depth += 1;
                    i += 2;
                } else if b[i] == b'*' && i + 1 < b.len() && b[i + 1] == b'/' {
                    depth -= 1;
                    i += 2;
                } else {
                    i += 1;
                }
            }
            out.push(b' ');
        } else {
            out.push(b[i]);
            i += 1;
        }
    }

    String::from_utf8_lossy(&out).into_owned()
}

struct Scanner<'a> {
    b: &'a [u8],
    i: usize,
}

impl<'a> Scanner<'a> {
    fn new(b: &'a [u8]) -> Self {
        Self { b, i: 0 }
    }

    fn at_end(&self) -> bool {
        self.i >= self.b.len()
    }

    fn skip_ws(&mut self) {
        while self.i < self.b.len() && self.b[self.i].is_ascii_whitespace() {
            self.i += 1;
        }
    }

    /// Advances to the next occurrence of `byte` without consuming it.
    fn seek_to(&mut self, byte: u8) {
        while self.i < self.b.len() && self.b[self.i] != byte {
            self.i += 1;
        }
    }

    /// Advances past the next occurrence of `byte`.
    fn seek_past(&mut self, byte: u8) {
        self.seek_to(byte);
        if self.i < self.b.len() {
            self.i += 1;
        }
    }

    fn eat_byte(&mut self, byte: u8) -> bool {
        if self.i < self.b.len() && self.b[self.i] == byte {
            self.i += 1;
            true
        } else {
            false
        }
    }

    fn eat_ident(&mut self) -> Option<String> {
        let start = self.i;
        if self.i < self.b.len()
            && (self.b[self.i].is_ascii_alphabetic() || self.b[self.i] == b'_')
        {
            self.i += 1;
            while self.i < self.b.len()
                && (self.b[self.i].is_ascii_alphanumeric() || self.b[self.i] == b'_')
            {
                self.i += 1;
            }
        }
        if self.i == start {
            return None;
        }
        Some(String::from_utf8_lossy(&self.b[start..self.i]).into_owned())
    }

    /// Consumes `word` only when it is followed by a non-identifier byte.
    fn eat_keyword(&mut self, word: &str) -> bool {
        let w = word.as_bytes();
        if !self.b[self.i..].starts_with(w) {
            return false;
        }
        let after = self.i + w.len();
        if after < self.b.len()
            && (self.b[after].is_ascii_alphanumeric() || self.b[after] == b'_')
        {
            return false;
        }
        self.i = after;
        true
    }

    /// Parses `( <int> )` with optional whitespace.
    fn eat_paren_u32(&mut self) -> Option<u32> {
        self.skip_ws();
        if !self.eat_byte(b'(') {
            return None;
        }
        self.skip_ws();

        let start = self.i;
        while self.i < self.b.len() && self.b[self.i].is_ascii_digit() {
            self.i += 1;
        }
        let value: u32 = std::str::from_utf8(&self.b[start..self.i])
            .ok()
            .and_then(|s| s.parse().ok())?;

        self.skip_ws();
        self.eat_byte(b')');
        Some(value)
    }

    /// Skips a balanced `( ... )` group if one starts here.
    fn skip_balanced_parens(&mut self) {
        if self.i >= self.b.len() || self.b[self.i] != b'(' {
            return;
        }
        let mut depth = 0u32;
        while self.i < self.b.len() {
            match self.b[self.i] {
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        self.i += 1;
                        return;
                    }
                }
                _ => {}
            }
            self.i += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUBE_SRC: &str = r#"
        struct Scene {
            mvp: mat4x4<f32>,
        };

        @group(0) @binding(0) var<uniform> scene: Scene;
        @group(1) @binding(0) var albedo_tex: texture_2d<f32>;
        @group(1) @binding(1) var albedo_smp: sampler;

        @vertex
        fn vs_main() -> @builtin(position) vec4<f32> {
            return scene.mvp * vec4<f32>(0.0);
        }

        @fragment
        fn fs_main() -> @location(0) vec4<f32> {
            return textureSample(albedo_tex, albedo_smp, vec2<f32>(0.0));
        }
    "#;

    fn find<'a>(r: &'a ShaderReflection, name: &str) -> &'a BindingDecl {
        r.bindings
            .iter()
            .find(|b| b.name == name)
            .unwrap_or_else(|| panic!("binding {name} not reflected"))
    }

    #[test]
    fn reflects_bindings_and_entry_points() {
        let r = reflect_wgsl(CUBE_SRC);

        assert_eq!(r.bindings.len(), 3);

        let scene = find(&r, "scene");
        assert_eq!((scene.group, scene.binding), (0, 0));
        assert_eq!(scene.class, BindingClass::Uniform);

        let tex = find(&r, "albedo_tex");
        assert_eq!((tex.group, tex.binding), (1, 0));
        assert_eq!(tex.class, BindingClass::Texture);

        let smp = find(&r, "albedo_smp");
        assert_eq!((smp.group, smp.binding), (1, 1));
        assert_eq!(smp.class, BindingClass::Sampler);

        assert_eq!(r.vertex_entry.as_deref(), Some("vs_main"));
        assert_eq!(r.fragment_entry.as_deref(), Some("fs_main"));
        assert_eq!(r.compute_entry, None);
    }

    #[test]
    fn attribute_order_does_not_matter() {
        let r = reflect_wgsl("@binding(3) @group(2) var t: texture_cube<f32>;");
        assert_eq!(r.bindings.len(), 1);
        assert_eq!((r.bindings[0].group, r.bindings[0].binding), (2, 3));
        assert_eq!(r.bindings[0].class, BindingClass::Texture);
    }

    #[test]
    fn whitespace_inside_attributes_is_tolerated() {
        let r = reflect_wgsl("@group ( 0 )\n@binding ( 7 )\nvar < uniform > u : U;");
        assert_eq!(r.bindings.len(), 1);
        assert_eq!(r.bindings[0].binding, 7);
        assert_eq!(r.bindings[0].class, BindingClass::Uniform);
    }

    #[test]
    fn commented_out_declarations_are_ignored() {
        let src = r#"
            // @group(0) @binding(0) var<uniform> dead: U;
            /* @group(0) @binding(1) var also_dead: sampler;
               /* nested */ still in comment */
            @group(0) @binding(2) var live: sampler;
        "#;
        let r = reflect_wgsl(src);
        assert_eq!(r.bindings.len(), 1);
        assert_eq!(r.bindings[0].name, "live");
        assert_eq!(r.bindings[0].binding, 2);
    }

    #[test]
    fn storage_declarations_are_classified() {
        let src = r#"
            @group(0) @binding(0) var<storage, read> data: array<f32>;
            @group(0) @binding(1) var img: texture_storage_2d<rgba8unorm, write>;
        "#;
        let r = reflect_wgsl(src);
        assert_eq!(r.bindings.len(), 2);
        assert!(r.bindings.iter().all(|b| b.class == BindingClass::Storage));
    }

    #[test]
    fn compute_entry_with_workgroup_size() {
        let r = reflect_wgsl("@compute @workgroup_size(8, 8, 1) fn cs_main() {}");
        assert_eq!(r.compute_entry.as_deref(), Some("cs_main"));
        assert!(r.bindings.is_empty());
    }

    #[test]
    fn sampler_comparison_is_a_sampler() {
        let r = reflect_wgsl("@group(1) @binding(5) var shadow_smp: sampler_comparison;");
        assert_eq!(r.bindings[0].class, BindingClass::Sampler);
    }

    #[test]
    fn plain_functions_are_not_entry_points() {
        let r = reflect_wgsl("fn helper() -> f32 { return 1.0; }");
        assert_eq!(r.vertex_entry, None);
        assert_eq!(r.fragment_entry, None);
    }
}
