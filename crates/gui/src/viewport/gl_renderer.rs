use std::collections::HashMap;

use glow::HasContext;
use shared::{ModelId, PartId};

use super::camera::OrbitCamera;
use super::lighting::SceneLights;
use super::mesh::{self, LineMeshData, MeshData, VERTEX_STRIDE};
use crate::state::settings::GridSettings;

// ── Render parameters ────────────────────────────────────────

/// Parameters for rendering the viewport
pub struct RenderParams {
    /// Viewport rectangle [x, y, width, height] in pixels
    pub viewport: [f32; 4],
    /// Show grid
    pub grid_visible: bool,
    /// Background color RGB
    pub bg_color: [u8; 3],
    /// Parts drawn with an outline
    pub outlined: Vec<PartId>,
    /// Outline color RGB
    pub outline_color: [u8; 3],
    /// Outline thickness in normalized screen units
    pub outline_width: f32,
}

// ── GPU mesh handles ─────────────────────────────────────────

struct GpuMesh {
    vao: glow::VertexArray,
    vbo: glow::Buffer,
    ibo: glow::Buffer,
    index_count: i32,
}

struct GpuLines {
    vao: glow::VertexArray,
    vbo: glow::Buffer,
    vertex_count: i32,
}

// ── Main GL renderer ─────────────────────────────────────────

pub struct GlRenderer {
    mesh_program: glow::Program,
    line_program: glow::Program,
    outline_program: glow::Program,
    grid: Option<GpuLines>,
    /// Cached grid settings to detect changes
    cached_grid_settings: Option<(i32, f32, f32)>,
    /// Visible part meshes in model space
    part_meshes: HashMap<PartId, GpuMesh>,
    /// Model id and version the uploaded meshes were built from
    uploaded: Option<(ModelId, u64)>,
}

impl GlRenderer {
    pub fn new(gl: &glow::Context) -> Result<Self, String> {
        let mesh_program = compile_program(gl, MESH_VERT, MESH_FRAG)?;
        let line_program = compile_program(gl, LINE_VERT, LINE_FRAG)?;
        let outline_program = compile_program(gl, OUTLINE_VERT, OUTLINE_FRAG)?;

        Ok(Self {
            mesh_program,
            line_program,
            outline_program,
            grid: None,
            cached_grid_settings: None,
            part_meshes: HashMap::new(),
            uploaded: None,
        })
    }

    /// Update grid mesh based on settings
    pub fn update_grid(&mut self, gl: &glow::Context, settings: &GridSettings) {
        let new_settings = (settings.range, settings.size, settings.opacity);

        if self.cached_grid_settings == Some(new_settings) {
            return;
        }

        if let Some(old) = self.grid.take() {
            delete_lines(gl, &old);
        }

        let grid_data = mesh::grid(settings.range, settings.size, settings.opacity);
        match upload_lines(gl, &grid_data) {
            Ok(grid) => self.grid = Some(grid),
            Err(e) => tracing::error!("Failed to upload grid: {e}"),
        }
        self.cached_grid_settings = Some(new_settings);
    }

    /// Replace uploaded part meshes when the model or its version changed
    pub fn sync_model(
        &mut self,
        gl: &glow::Context,
        key: Option<(ModelId, u64)>,
        meshes: &[(PartId, MeshData)],
    ) {
        if self.uploaded == key {
            return;
        }

        for (_, mesh) in self.part_meshes.drain() {
            delete_mesh(gl, &mesh);
        }

        for (part, data) in meshes {
            match upload_mesh(gl, data) {
                Ok(gpu) => {
                    self.part_meshes.insert(*part, gpu);
                }
                Err(e) => tracing::error!("Failed to upload mesh of part {part}: {e}"),
            }
        }
        self.uploaded = key;
    }

    /// Render the scene
    pub fn paint(&self, gl: &glow::Context, camera: &OrbitCamera, params: &RenderParams) {
        let aspect = params.viewport[2] / params.viewport[3].max(1.0);
        let vp = camera.view_projection(aspect);

        unsafe {
            gl.viewport(
                params.viewport[0] as i32,
                params.viewport[1] as i32,
                params.viewport[2] as i32,
                params.viewport[3] as i32,
            );
            gl.scissor(
                params.viewport[0] as i32,
                params.viewport[1] as i32,
                params.viewport[2] as i32,
                params.viewport[3] as i32,
            );
            gl.enable(glow::SCISSOR_TEST);

            // Clear viewport area with configured background color
            gl.clear_color(
                params.bg_color[0] as f32 / 255.0,
                params.bg_color[1] as f32 / 255.0,
                params.bg_color[2] as f32 / 255.0,
                1.0,
            );
            gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);

            gl.enable(glow::DEPTH_TEST);
            gl.depth_func(glow::LEQUAL);

            // Grid
            if params.grid_visible {
                if let Some(ref grid) = self.grid {
                    gl.use_program(Some(self.line_program));
                    set_uniform_mat4(gl, self.line_program, "u_mvp", &vp);
                    gl.enable(glow::BLEND);
                    gl.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);
                    draw_lines(gl, grid);
                    gl.disable(glow::BLEND);
                }
            }

            // Part meshes
            gl.use_program(Some(self.mesh_program));
            set_uniform_mat4(gl, self.mesh_program, "u_mvp", &vp);

            let lights = SceneLights::default();
            set_uniform_vec3(gl, self.mesh_program, "u_sky", &lights.sky);
            set_uniform_vec3(gl, self.mesh_program, "u_ground", &lights.ground);
            set_uniform_f32(gl, self.mesh_program, "u_hemisphere", lights.hemisphere_intensity);
            set_uniform_f32(gl, self.mesh_program, "u_ambient", lights.ambient_intensity);
            set_uniform_vec3(gl, self.mesh_program, "u_light_dir", &lights.direction);
            set_uniform_f32(gl, self.mesh_program, "u_directional", lights.directional_intensity);

            for mesh in self.part_meshes.values() {
                draw_mesh(gl, mesh);
            }

            // Outline: inflated back faces of the outlined parts
            if !params.outlined.is_empty() {
                gl.enable(glow::CULL_FACE);
                gl.cull_face(glow::FRONT);
                gl.use_program(Some(self.outline_program));
                set_uniform_mat4(gl, self.outline_program, "u_mvp", &vp);
                set_uniform_f32(gl, self.outline_program, "u_width", params.outline_width);
                let c = params.outline_color;
                let color = glam::Vec3::new(c[0] as f32, c[1] as f32, c[2] as f32) / 255.0;
                set_uniform_vec3(gl, self.outline_program, "u_color", &color);

                for part in &params.outlined {
                    if let Some(mesh) = self.part_meshes.get(part) {
                        draw_mesh(gl, mesh);
                    }
                }

                gl.cull_face(glow::BACK);
                gl.disable(glow::CULL_FACE);
            }

            gl.disable(glow::DEPTH_TEST);
            gl.disable(glow::SCISSOR_TEST);
            gl.use_program(None);
        }
    }
}

// ── GPU upload ───────────────────────────────────────────────

fn upload_mesh(gl: &glow::Context, data: &MeshData) -> Result<GpuMesh, String> {
    unsafe {
        let vao = gl.create_vertex_array()?;
        gl.bind_vertex_array(Some(vao));

        let vbo = gl.create_buffer()?;
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
        gl.buffer_data_u8_slice(
            glow::ARRAY_BUFFER,
            cast_slice(&data.vertices),
            glow::STATIC_DRAW,
        );

        let stride = (VERTEX_STRIDE * 4) as i32;
        // position: location 0
        gl.enable_vertex_attrib_array(0);
        gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, stride, 0);
        // normal: location 1
        gl.enable_vertex_attrib_array(1);
        gl.vertex_attrib_pointer_f32(1, 3, glow::FLOAT, false, stride, 3 * 4);
        // color: location 2
        gl.enable_vertex_attrib_array(2);
        gl.vertex_attrib_pointer_f32(2, 3, glow::FLOAT, false, stride, 6 * 4);

        let ibo = gl.create_buffer()?;
        gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ibo));
        gl.buffer_data_u8_slice(
            glow::ELEMENT_ARRAY_BUFFER,
            cast_slice(&data.indices),
            glow::STATIC_DRAW,
        );

        gl.bind_vertex_array(None);

        Ok(GpuMesh {
            vao,
            vbo,
            ibo,
            index_count: data.indices.len() as i32,
        })
    }
}

fn upload_lines(gl: &glow::Context, data: &LineMeshData) -> Result<GpuLines, String> {
    unsafe {
        let vao = gl.create_vertex_array()?;
        gl.bind_vertex_array(Some(vao));

        let vbo = gl.create_buffer()?;
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
        gl.buffer_data_u8_slice(
            glow::ARRAY_BUFFER,
            cast_slice(&data.vertices),
            glow::STATIC_DRAW,
        );

        let stride = 7 * 4; // 7 floats * 4 bytes
        // position: location 0
        gl.enable_vertex_attrib_array(0);
        gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, stride, 0);
        // color: location 1
        gl.enable_vertex_attrib_array(1);
        gl.vertex_attrib_pointer_f32(1, 4, glow::FLOAT, false, stride, 3 * 4);

        gl.bind_vertex_array(None);

        Ok(GpuLines {
            vao,
            vbo,
            vertex_count: (data.vertices.len() / 7) as i32,
        })
    }
}

fn delete_mesh(gl: &glow::Context, mesh: &GpuMesh) {
    unsafe {
        gl.delete_vertex_array(mesh.vao);
        gl.delete_buffer(mesh.vbo);
        gl.delete_buffer(mesh.ibo);
    }
}

fn delete_lines(gl: &glow::Context, lines: &GpuLines) {
    unsafe {
        gl.delete_vertex_array(lines.vao);
        gl.delete_buffer(lines.vbo);
    }
}

// ── Draw calls ───────────────────────────────────────────────

unsafe fn draw_mesh(gl: &glow::Context, mesh: &GpuMesh) {
    gl.bind_vertex_array(Some(mesh.vao));
    gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(mesh.ibo));
    gl.draw_elements(glow::TRIANGLES, mesh.index_count, glow::UNSIGNED_INT, 0);
    gl.bind_vertex_array(None);
}

unsafe fn draw_lines(gl: &glow::Context, lines: &GpuLines) {
    gl.bind_vertex_array(Some(lines.vao));
    gl.draw_arrays(glow::LINES, 0, lines.vertex_count);
    gl.bind_vertex_array(None);
}

// ── Shader compilation ───────────────────────────────────────

fn compile_shader(gl: &glow::Context, kind: u32, src: &str) -> Result<glow::Shader, String> {
    unsafe {
        let shader = gl.create_shader(kind)?;
        gl.shader_source(shader, src);
        gl.compile_shader(shader);
        if !gl.get_shader_compile_status(shader) {
            let log = gl.get_shader_info_log(shader);
            gl.delete_shader(shader);
            return Err(format!("shader compile error: {log}"));
        }
        Ok(shader)
    }
}

fn compile_program(gl: &glow::Context, vert_src: &str, frag_src: &str) -> Result<glow::Program, String> {
    unsafe {
        let program = gl.create_program()?;
        let vert = compile_shader(gl, glow::VERTEX_SHADER, vert_src)?;
        let frag = compile_shader(gl, glow::FRAGMENT_SHADER, frag_src)?;

        gl.attach_shader(program, vert);
        gl.attach_shader(program, frag);
        gl.link_program(program);

        gl.delete_shader(vert);
        gl.delete_shader(frag);

        if !gl.get_program_link_status(program) {
            let log = gl.get_program_info_log(program);
            gl.delete_program(program);
            return Err(format!("program link error: {log}"));
        }
        Ok(program)
    }
}

// ── Uniform setters ──────────────────────────────────────────

fn set_uniform_mat4(gl: &glow::Context, program: glow::Program, name: &str, mat: &glam::Mat4) {
    unsafe {
        let loc = gl.get_uniform_location(program, name);
        gl.uniform_matrix_4_f32_slice(loc.as_ref(), false, &mat.to_cols_array());
    }
}

fn set_uniform_vec3(gl: &glow::Context, program: glow::Program, name: &str, v: &glam::Vec3) {
    unsafe {
        let loc = gl.get_uniform_location(program, name);
        gl.uniform_3_f32(loc.as_ref(), v.x, v.y, v.z);
    }
}

fn set_uniform_f32(gl: &glow::Context, program: glow::Program, name: &str, v: f32) {
    unsafe {
        let loc = gl.get_uniform_location(program, name);
        gl.uniform_1_f32(loc.as_ref(), v);
    }
}

// ── Byte cast helper ─────────────────────────────────────────

fn cast_slice<T: Copy>(slice: &[T]) -> &[u8] {
    unsafe { std::slice::from_raw_parts(slice.as_ptr() as *const u8, std::mem::size_of_val(slice)) }
}

// ── Shaders ──────────────────────────────────────────────────

const MESH_VERT: &str = r#"#version 330 core
uniform mat4 u_mvp;

layout(location = 0) in vec3 a_position;
layout(location = 1) in vec3 a_normal;
layout(location = 2) in vec3 a_color;

out vec3 v_normal;
out vec3 v_color;

void main() {
    gl_Position = u_mvp * vec4(a_position, 1.0);
    v_normal = a_normal;
    v_color = a_color;
}
"#;

// Same sum as SceneLights::irradiance
const MESH_FRAG: &str = r#"#version 330 core
uniform vec3 u_sky;
uniform vec3 u_ground;
uniform float u_hemisphere;
uniform float u_ambient;
uniform vec3 u_light_dir;
uniform float u_directional;

in vec3 v_normal;
in vec3 v_color;

out vec4 frag_color;

void main() {
    vec3 n = normalize(v_normal);
    vec3 hemi = mix(u_ground, u_sky, n.y * 0.5 + 0.5) * u_hemisphere;
    float diffuse = max(dot(n, u_light_dir), 0.0) * u_directional;
    vec3 light = hemi + vec3(u_ambient + diffuse);
    frag_color = vec4(v_color * light, 1.0);
}
"#;

// Pushes each vertex outwards along its screen-space normal
const OUTLINE_VERT: &str = r#"#version 330 core
uniform mat4 u_mvp;
uniform float u_width;

layout(location = 0) in vec3 a_position;
layout(location = 1) in vec3 a_normal;

void main() {
    vec4 clip = u_mvp * vec4(a_position, 1.0);
    vec2 dir = (u_mvp * vec4(a_normal, 0.0)).xy;
    if (length(dir) > 1e-6) {
        clip.xy += normalize(dir) * u_width * clip.w;
    }
    gl_Position = clip;
}
"#;

const OUTLINE_FRAG: &str = r#"#version 330 core
uniform vec3 u_color;
out vec4 frag_color;

void main() {
    frag_color = vec4(u_color, 1.0);
}
"#;

const LINE_VERT: &str = r#"#version 330 core
uniform mat4 u_mvp;

layout(location = 0) in vec3 a_position;
layout(location = 1) in vec4 a_color;

out vec4 v_color;

void main() {
    gl_Position = u_mvp * vec4(a_position, 1.0);
    v_color = a_color;
}
"#;

const LINE_FRAG: &str = r#"#version 330 core
in vec4 v_color;
out vec4 frag_color;

void main() {
    frag_color = v_color;
}
"#;
