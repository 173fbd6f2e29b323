/// Vertex entry point of [`FORWARD_SHADER`].
pub const VERTEX_ENTRY: &str = "vs_main";

/// Fragment entry point of [`FORWARD_SHADER`].
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// WGSL forward shader: one directional light, metallic/roughness BRDF.
///
/// Group 0 holds the per-frame block, group 1 the per-instance block
/// (dynamic offset). Position, normal and UV arrive in three separate
/// vertex buffers.
pub const FORWARD_SHADER: &str = r#"
const PI: f32 = 3.14159265;

struct Frame {
    view_proj: mat4x4<f32>,
    light_dir: vec3<f32>,
    light_color: vec4<f32>,
    camera_pos: vec3<f32>,
};

struct Model {
    model: mat4x4<f32>,
    base_color: vec3<f32>,
    metallic: f32,
    roughness: f32,
};

@group(0) @binding(0)
var<uniform> frame: Frame;

@group(1) @binding(0)
var<uniform> object_data: Model;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    let world_pos = object_data.model * vec4<f32>(vertex.position, 1.0);

    var out: VertexOutput;
    out.clip_position = frame.view_proj * world_pos;
    out.world_pos = world_pos.xyz;
    out.world_normal = (object_data.model * vec4<f32>(vertex.normal, 0.0)).xyz;
    out.uv = vertex.uv;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let base = object_data.base_color;
    let metallic = clamp(object_data.metallic, 0.0, 1.0);
    let roughness = clamp(object_data.roughness, 0.04, 1.0);

    let n = normalize(in.world_normal);
    let v = normalize(frame.camera_pos - in.world_pos);
    let l = normalize(frame.light_dir);
    let h = normalize(v + l);

    let n_dot_l = max(dot(n, l), 0.0);
    let n_dot_v = max(dot(n, v), 1e-4);
    let n_dot_h = max(dot(n, h), 0.0);
    let v_dot_h = max(dot(v, h), 0.0);

    // GGX distribution
    let a = roughness * roughness;
    let a2 = a * a;
    let denom = n_dot_h * n_dot_h * (a2 - 1.0) + 1.0;
    let d = a2 / (PI * denom * denom);

    // Smith-Schlick geometry
    let k = (roughness + 1.0) * (roughness + 1.0) / 8.0;
    let g = (n_dot_v / (n_dot_v * (1.0 - k) + k)) * (n_dot_l / (n_dot_l * (1.0 - k) + k));

    // Schlick fresnel
    let f0 = mix(vec3<f32>(0.04), base, metallic);
    let f = f0 + (vec3<f32>(1.0) - f0) * pow(1.0 - v_dot_h, 5.0);

    let specular = d * g * f / max(4.0 * n_dot_v * n_dot_l, 1e-4);
    let kd = (vec3<f32>(1.0) - f) * (1.0 - metallic);
    let direct = (kd * base / PI + specular) * frame.light_color.rgb * n_dot_l;
    let ambient = 0.03 * base;

    return vec4<f32>(ambient + direct, 1.0);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_points_exist() {
        assert!(FORWARD_SHADER.contains(&format!("fn {VERTEX_ENTRY}(")));
        assert!(FORWARD_SHADER.contains(&format!("fn {FRAGMENT_ENTRY}(")));
    }

    #[test]
    fn vertex_slots_declared() {
        for loc in 0..3 {
            assert!(FORWARD_SHADER.contains(&format!("@location({loc})")));
        }
    }
}
