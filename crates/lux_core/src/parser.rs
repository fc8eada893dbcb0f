//! Scene file parser.
//!
//! Scene files are a whitespace-separated, brace-delimited block format:
//!
//! ```text
//! Camera { from 0 1 5 at 0 0 0 up 0 1 0 angle 40 width 320 height 240 }
//! Background { color 0.7 0.8 1.0 }
//! Materials {
//!     numMaterials 1
//!     Diffuse { Texture { Constant { color 0.8 0.3 0.3 } } }
//! }
//! Group {
//!     numObjects 1
//!     MaterialIndex 0
//!     Sphere { center 0 0 0 radius 1 }
//! }
//! ```
//!
//! `#` starts a comment that runs to the end of the line. `MaterialIndex`
//! applies to every object parsed after it, across nested groups, until the
//! next `MaterialIndex`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use lux_math::Vec3;
use thiserror::Error;

use crate::mesh::{Mesh, MeshError, MeshTransform};
use crate::scene::{CameraDesc, MaterialDesc, Object, Scene, Shape, TextureDesc};
use crate::texture::{resolve_path, TextureCache, TextureError, TextureFilter};

/// Errors that can occur while parsing a scene file.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Parse error at line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("Unexpected end of file after line {line}, expected {expected}")]
    UnexpectedEof { line: usize, expected: String },

    #[error("Invalid number at line {line}: '{token}'")]
    InvalidNumber { line: usize, token: String },

    #[error("MaterialIndex {index} at line {line} is out of range ({count} materials)")]
    MaterialIndex {
        line: usize,
        index: usize,
        count: usize,
    },

    #[error("Object at line {line} declared before any MaterialIndex")]
    NoMaterial { line: usize },

    #[error("Invalid Bezier curve at line {line}: {message}")]
    BezierCurve { line: usize, message: String },

    #[error("Scene has no Camera block")]
    MissingCamera,

    #[error("Texture at line {line}: {source}")]
    Texture {
        line: usize,
        #[source]
        source: TextureError,
    },

    #[error("Mesh at line {line}: {source}")]
    Mesh {
        line: usize,
        #[source]
        source: MeshError,
    },
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Token<'a> {
    text: &'a str,
    line: usize,
}

fn tokenize(source: &str) -> Vec<Token<'_>> {
    source
        .lines()
        .enumerate()
        .flat_map(|(i, line)| {
            let code = match line.find('#') {
                Some(comment) => &line[..comment],
                None => line,
            };
            code.split_whitespace().map(move |text| Token { text, line: i + 1 })
        })
        .collect()
}

/// Parse scene source with asset paths resolved against the working
/// directory.
pub fn parse_scene(source: &str) -> ParseResult<Scene> {
    SceneParser::new(source, None).parse()
}

/// Recursive-descent parser over a token stream.
pub struct SceneParser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
    base_dir: Option<PathBuf>,
    textures: TextureCache,
    camera: Option<CameraDesc>,
    background: Vec3,
    materials: Vec<MaterialDesc>,
    current_material: Option<usize>,
}

impl<'a> SceneParser<'a> {
    /// Create a parser. Relative asset paths that do not exist as given are
    /// resolved against `base_dir`.
    pub fn new(source: &'a str, base_dir: Option<&Path>) -> Self {
        let textures = match base_dir {
            Some(dir) => TextureCache::with_base_dir(dir),
            None => TextureCache::new(),
        };

        Self {
            tokens: tokenize(source),
            pos: 0,
            base_dir: base_dir.map(Path::to_path_buf),
            textures,
            camera: None,
            background: Vec3::ZERO,
            materials: Vec::new(),
            current_material: None,
        }
    }

    /// Parse the whole token stream into a scene.
    pub fn parse(mut self) -> ParseResult<Scene> {
        let mut objects = Vec::new();

        while let Some(token) = self.advance() {
            match token.text {
                "Camera" => self.camera = Some(self.parse_camera()?),
                "Background" => self.background = self.parse_background()?,
                "Materials" => self.materials = self.parse_materials()?,
                "Group" => objects.extend(self.parse_group()?),
                other => return Err(unknown(token.line, "scene", other)),
            }
        }

        let camera = self.camera.ok_or(ParseError::MissingCamera)?;
        log::debug!(
            "Parsed scene: {} materials, {} top-level objects, {} cached textures",
            self.materials.len(),
            objects.len(),
            self.textures.len()
        );

        Ok(Scene {
            camera,
            background: self.background,
            materials: self.materials,
            objects,
        })
    }

    // ------------------------------------------------------------------
    // Top-level blocks
    // ------------------------------------------------------------------

    fn parse_camera(&mut self) -> ParseResult<CameraDesc> {
        let open = self.expect("{")?;

        let mut from = None;
        let mut at = None;
        let mut up = None;
        let mut angle = None;
        let mut width = None;
        let mut height = None;
        let mut camera = CameraDesc::new(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y, 90.0, 1, 1);

        loop {
            let token = self.next("camera parameter")?;
            match token.text {
                "from" => from = Some(self.read_vec3()?),
                "at" => at = Some(self.read_vec3()?),
                "up" => up = Some(self.read_vec3()?),
                "angle" => angle = Some(self.read_f32()?),
                "width" => width = Some(self.read_dimension()?),
                "height" => height = Some(self.read_dimension()?),
                "aperture" => camera.aperture = self.read_f32()?,
                "focus_dist" => camera.focus_dist = self.read_f32()?,
                "time0" => camera.time0 = self.read_f32()?,
                "time1" => camera.time1 = self.read_f32()?,
                "}" => break,
                other => return Err(unknown(token.line, "Camera", other)),
            }
        }

        let missing = |name: &str| syntax(open, format!("Camera is missing '{}'", name));
        camera.from = from.ok_or_else(|| missing("from"))?;
        camera.at = at.ok_or_else(|| missing("at"))?;
        camera.up = up.ok_or_else(|| missing("up"))?;
        camera.fov_degrees = angle.ok_or_else(|| missing("angle"))?;
        camera.width = width.ok_or_else(|| missing("width"))?;
        camera.height = height.ok_or_else(|| missing("height"))?;

        Ok(camera)
    }

    fn parse_background(&mut self) -> ParseResult<Vec3> {
        self.expect("{")?;
        let mut color = Vec3::ZERO;

        loop {
            let token = self.next("background parameter")?;
            match token.text {
                "color" => color = self.read_vec3()?,
                "}" => break,
                other => return Err(unknown(token.line, "Background", other)),
            }
        }

        Ok(color)
    }

    fn parse_materials(&mut self) -> ParseResult<Vec<MaterialDesc>> {
        self.expect("{")?;
        self.expect("numMaterials")?;
        let count = self.read_usize()?;

        let mut materials = Vec::with_capacity(count);
        for _ in 0..count {
            let token = self.next("material")?;
            let material = match token.text {
                "Diffuse" => MaterialDesc::Diffuse {
                    texture: self.parse_textured_material(token, "Diffuse")?,
                },
                "Specular" => self.parse_specular(token)?,
                "Refract" => self.parse_refract()?,
                "DiffuseLight" => MaterialDesc::DiffuseLight {
                    texture: self.parse_textured_material(token, "DiffuseLight")?,
                },
                other => return Err(unknown(token.line, "Materials", other)),
            };
            materials.push(material);
        }

        self.expect("}")?;
        Ok(materials)
    }

    // ------------------------------------------------------------------
    // Materials and textures
    // ------------------------------------------------------------------

    /// `{ Texture { ... } }` for materials whose only parameter is a texture.
    fn parse_textured_material(&mut self, start: Token<'a>, kind: &str) -> ParseResult<TextureDesc> {
        self.expect("{")?;
        let mut texture = None;

        loop {
            let token = self.next("material parameter")?;
            match token.text {
                "Texture" => texture = Some(self.parse_texture()?),
                "}" => break,
                other => return Err(unknown(token.line, kind, other)),
            }
        }

        texture.ok_or_else(|| syntax(start.line, format!("{} material requires a Texture", kind)))
    }

    fn parse_specular(&mut self, start: Token<'a>) -> ParseResult<MaterialDesc> {
        self.expect("{")?;
        let mut texture = None;
        let mut fuzz = 0.0;

        loop {
            let token = self.next("material parameter")?;
            match token.text {
                "Texture" => texture = Some(self.parse_texture()?),
                "fuzz" => fuzz = self.read_f32()?,
                "}" => break,
                other => return Err(unknown(token.line, "Specular", other)),
            }
        }

        let texture = texture
            .ok_or_else(|| syntax(start.line, "Specular material requires a Texture".to_string()))?;
        Ok(MaterialDesc::Specular { texture, fuzz })
    }

    fn parse_refract(&mut self) -> ParseResult<MaterialDesc> {
        self.expect("{")?;
        let mut ri = 1.0;
        let mut color = Vec3::ONE;

        loop {
            let token = self.next("material parameter")?;
            match token.text {
                "ref" => ri = self.read_f32()?,
                "color" => color = self.read_vec3()?,
                "}" => break,
                other => return Err(unknown(token.line, "Refract", other)),
            }
        }

        Ok(MaterialDesc::Refract { ri, color })
    }

    /// `{ Constant|Checker|Noise|Image { ... } }`
    fn parse_texture(&mut self) -> ParseResult<TextureDesc> {
        self.expect("{")?;
        let token = self.next("texture type")?;

        let texture = match token.text {
            "Constant" => {
                let mut color = Vec3::ZERO;
                self.parse_params("Constant", |p, key| match key {
                    "color" => {
                        color = p.read_vec3()?;
                        Ok(true)
                    }
                    _ => Ok(false),
                })?;
                TextureDesc::Constant(color)
            }
            "Checker" => {
                let (mut color1, mut color2, mut scale) = (Vec3::ZERO, Vec3::ONE, 1.0);
                self.parse_params("Checker", |p, key| {
                    match key {
                        "color1" => color1 = p.read_vec3()?,
                        "color2" => color2 = p.read_vec3()?,
                        "scale" => scale = p.read_f32()?,
                        _ => return Ok(false),
                    }
                    Ok(true)
                })?;
                TextureDesc::Checker {
                    color1,
                    color2,
                    scale,
                }
            }
            "Noise" => {
                let (mut scale, mut color1, mut color2) = (1.0, Vec3::ONE, Vec3::ONE);
                self.parse_params("Noise", |p, key| {
                    match key {
                        "scale" => scale = p.read_f32()?,
                        "color1" => color1 = p.read_vec3()?,
                        "color2" => color2 = p.read_vec3()?,
                        _ => return Ok(false),
                    }
                    Ok(true)
                })?;
                TextureDesc::Noise {
                    scale,
                    color1,
                    color2,
                }
            }
            "Image" => self.parse_image_texture(token)?,
            other => return Err(unknown(token.line, "Texture", other)),
        };

        self.expect("}")?;
        Ok(texture)
    }

    fn parse_image_texture(&mut self, start: Token<'a>) -> ParseResult<TextureDesc> {
        let mut src = None;
        let mut filter = TextureFilter::Nearest;

        self.parse_params("Image", |p, key| {
            match key {
                "src" => src = Some(p.next("image path")?),
                "filter" => {
                    let token = p.next("texture filter")?;
                    filter = match token.text {
                        "nearest" => TextureFilter::Nearest,
                        "bilinear" => TextureFilter::Bilinear,
                        other => return Err(unknown(token.line, "filter", other)),
                    };
                }
                _ => return Ok(false),
            }
            Ok(true)
        })?;

        let src = src.ok_or_else(|| syntax(start.line, "Image texture requires 'src'".to_string()))?;
        let image = self
            .textures
            .load(src.text)
            .map_err(|source| ParseError::Texture {
                line: src.line,
                source,
            })?;

        Ok(TextureDesc::Image { image, filter })
    }

    /// Parse `{ key value ... }`. `handle` consumes the value for a key it
    /// knows and returns true; any other key is an error.
    fn parse_params<F>(&mut self, block: &str, mut handle: F) -> ParseResult<()>
    where
        F: FnMut(&mut Self, &str) -> ParseResult<bool>,
    {
        self.expect("{")?;
        loop {
            let token = self.next("parameter")?;
            if token.text == "}" {
                return Ok(());
            }
            if !handle(self, token.text)? {
                return Err(unknown(token.line, block, token.text));
            }
        }
    }

    // ------------------------------------------------------------------
    // Objects
    // ------------------------------------------------------------------

    fn parse_group(&mut self) -> ParseResult<Vec<Object>> {
        self.expect("{")?;
        self.expect("numObjects")?;
        let count = self.read_usize()?;

        let mut objects = Vec::with_capacity(count);
        while objects.len() < count {
            let token = self.next("object")?;
            if token.text == "MaterialIndex" {
                let index = self.read_usize()?;
                if index >= self.materials.len() {
                    return Err(ParseError::MaterialIndex {
                        line: token.line,
                        index,
                        count: self.materials.len(),
                    });
                }
                self.current_material = Some(index);
            } else {
                objects.push(self.parse_object(token)?);
            }
        }

        self.expect("}")?;
        Ok(objects)
    }

    fn parse_object(&mut self, token: Token<'a>) -> ParseResult<Object> {
        let shape = match token.text {
            "Group" => return Ok(Object::Group(self.parse_group()?)),
            "Medium" => return self.parse_medium(),
            "Sphere" => self.parse_sphere()?,
            "MovSphere" => self.parse_moving_sphere()?,
            "Triangle" => Shape::Triangle(self.parse_vertices()?),
            "Rectangle" => Shape::Rectangle(self.parse_vertices()?),
            "TriangleMesh" => self.parse_triangle_mesh()?,
            "RevSurface" => self.parse_revolution()?,
            other => return Err(unknown(token.line, "Group", other)),
        };

        let material = self
            .current_material
            .ok_or(ParseError::NoMaterial { line: token.line })?;
        Ok(Object::Surface { material, shape })
    }

    fn parse_sphere(&mut self) -> ParseResult<Shape> {
        self.expect("{")?;
        self.expect("center")?;
        let center = self.read_vec3()?;
        self.expect("radius")?;
        let radius = self.read_f32()?;
        self.expect("}")?;

        Ok(Shape::Sphere { center, radius })
    }

    fn parse_moving_sphere(&mut self) -> ParseResult<Shape> {
        self.expect("{")?;
        self.expect("center0")?;
        let center0 = self.read_vec3()?;
        self.expect("center1")?;
        let center1 = self.read_vec3()?;
        self.expect("t0")?;
        let time0 = self.read_f32()?;
        self.expect("t1")?;
        let time1 = self.read_f32()?;
        self.expect("radius")?;
        let radius = self.read_f32()?;
        self.expect("}")?;

        Ok(Shape::MovingSphere {
            center0,
            center1,
            time0,
            time1,
            radius,
        })
    }

    fn parse_vertices(&mut self) -> ParseResult<[Vec3; 3]> {
        self.expect("{")?;
        self.expect("vertex0")?;
        let v0 = self.read_vec3()?;
        self.expect("vertex1")?;
        let v1 = self.read_vec3()?;
        self.expect("vertex2")?;
        let v2 = self.read_vec3()?;
        self.expect("}")?;

        Ok([v0, v1, v2])
    }

    fn parse_triangle_mesh(&mut self) -> ParseResult<Shape> {
        self.expect("{")?;
        self.expect("obj_file")?;
        let file = self.next("OBJ file path")?;

        let mut transform = MeshTransform::default();
        loop {
            let token = self.next("mesh parameter")?;
            match token.text {
                "scale" => transform.scale = self.read_vec3()?,
                "center" => transform.center = self.read_vec3()?,
                "rotateY" => transform.rotate_y = self.read_f32()?,
                "}" => break,
                other => return Err(unknown(token.line, "TriangleMesh", other)),
            }
        }

        if !file.text.to_ascii_lowercase().ends_with(".obj") {
            return Err(syntax(
                file.line,
                format!("mesh file '{}' is not an .obj file", file.text),
            ));
        }

        let path = resolve_path(self.base_dir.as_deref(), file.text);
        let mesh = Mesh::load_obj(&path, &transform).map_err(|source| ParseError::Mesh {
            line: file.line,
            source,
        })?;

        Ok(Shape::Mesh(Arc::new(mesh)))
    }

    fn parse_revolution(&mut self) -> ParseResult<Shape> {
        self.expect("{")?;
        self.expect("center")?;
        let center = self.read_vec3()?;
        self.expect("scale")?;
        let scale = self.read_vec3()?;
        self.expect("profile")?;

        let profile = self.next("profile curve")?;
        if profile.text != "BezierCurve" {
            return Err(unknown(profile.line, "profile", profile.text));
        }
        let controls = self.parse_bezier_controls(profile.line, scale)?;
        self.expect("}")?;

        Ok(Shape::Revolution { center, controls })
    }

    /// `{ controls [ x y z ] [ x y z ] ... }`, each point scaled
    /// componentwise by `scale`.
    fn parse_bezier_controls(&mut self, line: usize, scale: Vec3) -> ParseResult<Vec<Vec3>> {
        self.expect("{")?;
        self.expect("controls")?;

        let mut controls = Vec::new();
        loop {
            let token = self.next("control point")?;
            match token.text {
                "[" => {
                    let point = self.read_vec3()? * scale;
                    self.expect("]")?;
                    if point.z != 0.0 {
                        return Err(ParseError::BezierCurve {
                            line: token.line,
                            message: format!("control point {} does not lie in the XY plane", point),
                        });
                    }
                    controls.push(point);
                }
                "}" => break,
                other => return Err(unknown(token.line, "BezierCurve", other)),
            }
        }

        if controls.len() < 4 || (controls.len() - 1) % 3 != 0 {
            return Err(ParseError::BezierCurve {
                line,
                message: format!(
                    "expected 3k+1 control points (k >= 1), found {}",
                    controls.len()
                ),
            });
        }

        Ok(controls)
    }

    fn parse_medium(&mut self) -> ParseResult<Object> {
        self.expect("{")?;
        let token = self.next("medium boundary")?;
        let boundary = self.parse_object(token)?;
        self.expect("dense")?;
        let density = self.read_f32()?;
        self.expect("color")?;
        let color = self.read_vec3()?;
        self.expect("}")?;

        Ok(Object::Medium {
            boundary: Box::new(boundary),
            density,
            color,
        })
    }

    // ------------------------------------------------------------------
    // Token helpers
    // ------------------------------------------------------------------

    fn advance(&mut self) -> Option<Token<'a>> {
        let token = self.tokens.get(self.pos).copied();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn next(&mut self, expected: &str) -> ParseResult<Token<'a>> {
        let line = self.current_line();
        self.advance().ok_or_else(|| ParseError::UnexpectedEof {
            line,
            expected: expected.to_string(),
        })
    }

    /// Consume `keyword` and return its line.
    fn expect(&mut self, keyword: &str) -> ParseResult<usize> {
        let token = self.next(&format!("'{}'", keyword))?;
        if token.text != keyword {
            return Err(syntax(
                token.line,
                format!("expected '{}', found '{}'", keyword, token.text),
            ));
        }
        Ok(token.line)
    }

    fn current_line(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map_or(0, |t| t.line)
    }

    fn read_f32(&mut self) -> ParseResult<f32> {
        let token = self.next("number")?;
        token.text.parse().map_err(|_| invalid_number(token))
    }

    fn read_usize(&mut self) -> ParseResult<usize> {
        let token = self.next("integer")?;
        token.text.parse().map_err(|_| invalid_number(token))
    }

    fn read_dimension(&mut self) -> ParseResult<u32> {
        let token = self.next("image dimension")?;
        match token.text.parse::<u32>() {
            Ok(value) if value > 0 => Ok(value),
            _ => Err(invalid_number(token)),
        }
    }

    fn read_vec3(&mut self) -> ParseResult<Vec3> {
        let x = self.read_f32()?;
        let y = self.read_f32()?;
        let z = self.read_f32()?;
        Ok(Vec3::new(x, y, z))
    }
}

fn syntax(line: usize, message: String) -> ParseError {
    ParseError::Syntax { line, message }
}

fn unknown(line: usize, block: &str, token: &str) -> ParseError {
    syntax(line, format!("unknown token in {}: '{}'", block, token))
}

fn invalid_number(token: Token<'_>) -> ParseError {
    ParseError::InvalidNumber {
        line: token.line,
        token: token.text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAMERA: &str = "Camera { from 0 0 5 at 0 0 0 up 0 1 0 angle 40 width 20 height 10 }\n";

    const ONE_MATERIAL: &str = "Materials {
        numMaterials 1
        Diffuse { Texture { Constant { color 0.5 0.5 0.5 } } }
    }\n";

    fn with_camera(body: &str) -> String {
        format!("{}{}", CAMERA, body)
    }

    fn parse(source: &str) -> ParseResult<Scene> {
        parse_scene(source)
    }

    #[test]
    fn test_tokenize_tracks_lines_and_comments() {
        let tokens = tokenize("Camera {\n  # comment { }\n  from 1 2 3 # trailing\n}");
        let texts: Vec<_> = tokens.iter().map(|t| t.text).collect();

        assert_eq!(texts, ["Camera", "{", "from", "1", "2", "3", "}"]);
        assert_eq!(tokens[2].line, 3);
        assert_eq!(tokens[6].line, 4);
    }

    #[test]
    fn test_parse_camera() {
        let scene = parse(
            "Camera {
                from 0 1 5 at 0 0 0 up 0 1 0 angle 30 width 320 height 240
                aperture 0.1 focus_dist 4.5 time0 0 time1 1
            }",
        )
        .unwrap();

        let camera = &scene.camera;
        assert_eq!(camera.from, Vec3::new(0.0, 1.0, 5.0));
        assert_eq!(camera.fov_degrees, 30.0);
        assert_eq!((camera.width, camera.height), (320, 240));
        assert_eq!(camera.aperture, 0.1);
        assert_eq!(camera.focus_dist, 4.5);
        assert_eq!(camera.time1, 1.0);
        assert_eq!(scene.background, Vec3::ZERO);
    }

    #[test]
    fn test_camera_optional_keys_default() {
        let scene = parse(CAMERA).unwrap();

        assert_eq!(scene.camera.aperture, 0.0);
        assert_eq!(scene.camera.time0, 0.0);
        assert_eq!(scene.camera.time1, 0.0);
    }

    #[test]
    fn test_camera_missing_key() {
        let err = parse("Camera { from 0 0 5 at 0 0 0 up 0 1 0 width 20 height 10 }").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { line: 1, .. }), "{}", err);
    }

    #[test]
    fn test_missing_camera() {
        let err = parse("Background { color 1 1 1 }").unwrap_err();
        assert!(matches!(err, ParseError::MissingCamera));
    }

    #[test]
    fn test_parse_background() {
        let scene = parse(&with_camera("Background { color 0.7 0.8 1 }")).unwrap();
        assert_eq!(scene.background, Vec3::new(0.7, 0.8, 1.0));
    }

    #[test]
    fn test_parse_materials() {
        let scene = parse(&with_camera(
            "Materials {
                numMaterials 4
                Diffuse { Texture { Checker { color1 0 0 0 color2 1 1 1 scale 10 } } }
                Specular { Texture { Constant { color 0.8 0.8 0.8 } } fuzz 0.3 }
                Refract { ref 1.5 }
                DiffuseLight { Texture { Noise { scale 4 color1 1 0 0 } } }
            }",
        ))
        .unwrap();

        assert_eq!(scene.materials.len(), 4);
        assert!(matches!(
            scene.materials[0],
            MaterialDesc::Diffuse {
                texture: TextureDesc::Checker { scale, .. }
            } if scale == 10.0
        ));
        assert!(matches!(scene.materials[1], MaterialDesc::Specular { fuzz, .. } if fuzz == 0.3));
        assert!(matches!(
            scene.materials[2],
            MaterialDesc::Refract { ri, color } if ri == 1.5 && color == Vec3::ONE
        ));
        match &scene.materials[3] {
            MaterialDesc::DiffuseLight {
                texture: TextureDesc::Noise { scale, color1, color2 },
            } => {
                assert_eq!(*scale, 4.0);
                assert_eq!(*color1, Vec3::X);
                assert_eq!(*color2, Vec3::ONE);
            }
            other => panic!("unexpected material {:?}", other),
        }
    }

    #[test]
    fn test_material_requires_texture() {
        let err = parse(&with_camera("Materials { numMaterials 1 Diffuse { } }")).unwrap_err();
        assert!(matches!(err, ParseError::Syntax { line: 2, .. }), "{}", err);
    }

    #[test]
    fn test_unknown_material() {
        let err = parse(&with_camera("Materials { numMaterials 1 Plastic { } }")).unwrap_err();
        assert!(err.to_string().contains("Plastic"));
    }

    #[test]
    fn test_parse_objects() {
        let scene = parse(&with_camera(&format!(
            "{}Group {{
                numObjects 5
                MaterialIndex 0
                Sphere {{ center 0 0 0 radius 1 }}
                MovSphere {{ center0 0 0 0 center1 0 1 0 t0 0 t1 1 radius 0.5 }}
                Triangle {{ vertex0 0 0 0 vertex1 1 0 0 vertex2 0 1 0 }}
                Rectangle {{ vertex0 0 1 0 vertex1 0 0 0 vertex2 1 0 0 }}
                RevSurface {{
                    center 0 0 0 scale 2 1 1
                    profile BezierCurve {{ controls [ 1 0 0 ] [ 1 1 0 ] [ 1 2 0 ] [ 1 3 0 ] }}
                }}
            }}",
            ONE_MATERIAL
        )))
        .unwrap();

        assert_eq!(scene.objects.len(), 5);
        assert_eq!(scene.triangle_count(), 3);

        match &scene.objects[1] {
            Object::Surface {
                material: 0,
                shape: Shape::MovingSphere { center1, time1, .. },
            } => {
                assert_eq!(*center1, Vec3::Y);
                assert_eq!(*time1, 1.0);
            }
            other => panic!("unexpected object {:?}", other),
        }

        match &scene.objects[4] {
            Object::Surface {
                shape: Shape::Revolution { controls, .. },
                ..
            } => {
                assert_eq!(controls.len(), 4);
                // Scaled componentwise
                assert_eq!(controls[0], Vec3::new(2.0, 0.0, 0.0));
            }
            other => panic!("unexpected object {:?}", other),
        }
    }

    #[test]
    fn test_material_index_scoping_crosses_groups() {
        let scene = parse(&with_camera(
            "Materials {
                numMaterials 2
                Diffuse { Texture { Constant { color 1 0 0 } } }
                DiffuseLight { Texture { Constant { color 4 4 4 } } }
            }
            Group {
                numObjects 3
                MaterialIndex 0
                Group {
                    numObjects 1
                    MaterialIndex 1
                    Sphere { center 0 0 0 radius 1 }
                }
                Sphere { center 0 2 0 radius 1 }
                MaterialIndex 0
                Medium { Sphere { center 0 0 0 radius 3 } dense 0.2 color 1 1 1 }
            }",
        ))
        .unwrap();

        assert_eq!(scene.object_count(), 3);
        match &scene.objects[0] {
            Object::Group(children) => {
                assert!(matches!(children[0], Object::Surface { material: 1, .. }));
            }
            other => panic!("unexpected object {:?}", other),
        }
        // The index set inside the nested group is still current after it
        assert!(matches!(scene.objects[1], Object::Surface { material: 1, .. }));
        assert!(matches!(scene.objects[2], Object::Medium { density, .. } if density == 0.2));
    }

    #[test]
    fn test_material_index_out_of_range() {
        let err = parse(&with_camera(&format!(
            "{}Group {{\n numObjects 1\n MaterialIndex 1\n Sphere {{ center 0 0 0 radius 1 }} }}",
            ONE_MATERIAL
        )))
        .unwrap_err();

        assert!(
            matches!(err, ParseError::MaterialIndex { line: 8, index: 1, count: 1 }),
            "{}",
            err
        );
    }

    #[test]
    fn test_object_before_material_index() {
        let err = parse(&with_camera(&format!(
            "{}Group {{ numObjects 1 Sphere {{ center 0 0 0 radius 1 }} }}",
            ONE_MATERIAL
        )))
        .unwrap_err();

        assert!(matches!(err, ParseError::NoMaterial { .. }), "{}", err);
    }

    #[test]
    fn test_bezier_control_count() {
        let err = parse(&with_camera(&format!(
            "{}Group {{ numObjects 1 MaterialIndex 0 RevSurface {{
                center 0 0 0 scale 1 1 1
                profile BezierCurve {{ controls [ 1 0 0 ] [ 1 1 0 ] [ 1 2 0 ] }}
            }} }}",
            ONE_MATERIAL
        )))
        .unwrap_err();

        assert!(matches!(err, ParseError::BezierCurve { .. }), "{}", err);
    }

    #[test]
    fn test_bezier_control_off_plane() {
        let err = parse(&with_camera(&format!(
            "{}Group {{ numObjects 1 MaterialIndex 0 RevSurface {{
                center 0 0 0 scale 1 1 1
                profile BezierCurve {{ controls [ 1 0 0 ] [ 1 1 0.5 ] [ 1 2 0 ] [ 1 3 0 ] }}
            }} }}",
            ONE_MATERIAL
        )))
        .unwrap_err();

        assert!(matches!(err, ParseError::BezierCurve { .. }), "{}", err);
    }

    #[test]
    fn test_invalid_number() {
        let err = parse(&with_camera("Background {\n color 1 one 1 }")).unwrap_err();
        assert!(
            matches!(&err, ParseError::InvalidNumber { line: 3, token } if token == "one"),
            "{}",
            err
        );
    }

    #[test]
    fn test_unexpected_eof() {
        let err = parse(&with_camera("Group { numObjects 2")).unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEof { line: 2, .. }), "{}", err);
    }

    #[test]
    fn test_unknown_top_level_token() {
        let err = parse("Lights { }").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { line: 1, .. }));
    }

    #[test]
    fn test_missing_image_is_error() {
        let err = parse(&with_camera(
            "Materials { numMaterials 1 Diffuse { Texture { Image { src no/such/file.png } } } }",
        ))
        .unwrap_err();

        assert!(matches!(err, ParseError::Texture { line: 2, .. }), "{}", err);
    }

    #[test]
    fn test_triangle_mesh_requires_obj() {
        let err = parse(&with_camera(&format!(
            "{}Group {{ numObjects 1 MaterialIndex 0 TriangleMesh {{ obj_file bunny.ply }} }}",
            ONE_MATERIAL
        )))
        .unwrap_err();

        assert!(err.to_string().contains("bunny.ply"));
    }

    #[test]
    fn test_triangle_mesh_resolves_against_base_dir() {
        let dir = std::env::temp_dir().join("lux_core_parser_mesh_test");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("tri.obj"), "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();

        let source = with_camera(&format!(
            "{}Group {{ numObjects 1 MaterialIndex 0
                TriangleMesh {{ obj_file tri.obj scale 2 2 2 center 0 0 -1 }} }}",
            ONE_MATERIAL
        ));
        let scene = SceneParser::new(&source, Some(&dir)).parse().unwrap();
        std::fs::remove_dir_all(&dir).ok();

        match &scene.objects[0] {
            Object::Surface {
                shape: Shape::Mesh(mesh),
                ..
            } => {
                assert_eq!(mesh.triangle_count(), 1);
                assert_eq!(mesh.positions[1], Vec3::new(2.0, 0.0, -1.0));
            }
            other => panic!("unexpected object {:?}", other),
        }
    }
}
