/// Lit, tinted mesh pass. One uniform slot per draw, selected by dynamic offset.
pub const SCENE_SHADER: &str = r#"
struct DrawUniforms {
    world: mat4x4<f32>,
    view_proj: mat4x4<f32>,
    tint: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> draw: DrawUniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_normal: vec3<f32>,
};

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    let world_pos = draw.world * vec4<f32>(vertex.position, 1.0);
    let world_normal = (draw.world * vec4<f32>(vertex.normal, 0.0)).xyz;

    var out: VertexOutput;
    out.clip_position = draw.view_proj * world_pos;
    out.world_normal = normalize(world_normal);
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let light_dir = normalize(vec3<f32>(0.3, 1.0, 0.5));
    let ambient = 0.3;
    let diffuse = max(dot(normalize(in.world_normal), light_dir), 0.0);
    let lighting = ambient + diffuse * 0.7;
    return vec4<f32>(draw.tint.rgb * lighting, draw.tint.a);
}
"#;

/// Sobel edge detection over the color buffer, one invocation per pixel.
/// Writes 1.0 where the image is flat and falls towards 0.0 on edges.
pub const EDGE_SHADER: &str = r#"
@group(0) @binding(0)
var color_input: texture_2d<f32>;

@group(0) @binding(1)
var edge_output: texture_storage_2d<rgba16float, write>;

fn luminance(coord: vec2<i32>, dims: vec2<i32>) -> f32 {
    let c = clamp(coord, vec2<i32>(0, 0), dims - vec2<i32>(1, 1));
    let rgb = textureLoad(color_input, c, 0).rgb;
    return dot(rgb, vec3<f32>(0.299, 0.587, 0.114));
}

@compute @workgroup_size(16, 16, 1)
fn cs_main(@builtin(global_invocation_id) gid: vec3<u32>) {
    let dims = vec2<i32>(textureDimensions(color_input));
    let p = vec2<i32>(gid.xy);
    if (p.x >= dims.x || p.y >= dims.y) {
        return;
    }

    let tl = luminance(p + vec2<i32>(-1, -1), dims);
    let t  = luminance(p + vec2<i32>( 0, -1), dims);
    let tr = luminance(p + vec2<i32>( 1, -1), dims);
    let l  = luminance(p + vec2<i32>(-1,  0), dims);
    let r  = luminance(p + vec2<i32>( 1,  0), dims);
    let bl = luminance(p + vec2<i32>(-1,  1), dims);
    let b  = luminance(p + vec2<i32>( 0,  1), dims);
    let br = luminance(p + vec2<i32>( 1,  1), dims);

    let gx = (tr + 2.0 * r + br) - (tl + 2.0 * l + bl);
    let gy = (bl + 2.0 * b + br) - (tl + 2.0 * t + tr);
    let edge = 1.0 - clamp(sqrt(gx * gx + gy * gy), 0.0, 1.0);

    textureStore(edge_output, p, vec4<f32>(edge, edge, edge, 1.0));
}
"#;

/// Full-screen composite: color modulated by the edge factor. The quad is
/// synthesized from the vertex index, no vertex buffer.
pub const COMPOSITE_SHADER: &str = r#"
@group(0) @binding(0)
var color_tex: texture_2d<f32>;

@group(0) @binding(1)
var edge_tex: texture_2d<f32>;

@group(0) @binding(2)
var point_clamp: sampler;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>( 1.0,  1.0),
    );
    let xy = corners[vertex_index];

    var out: VertexOutput;
    out.position = vec4<f32>(xy, 0.0, 1.0);
    out.uv = vec2<f32>(xy.x * 0.5 + 0.5, 0.5 - xy.y * 0.5);
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSample(color_tex, point_clamp, in.uv);
    let edge = textureSample(edge_tex, point_clamp, in.uv).r;
    return vec4<f32>(color.rgb * edge, 1.0);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_workgroup_matches_tile_size() {
        let tile = edgeview_render::EDGE_TILE_SIZE;
        assert!(EDGE_SHADER.contains(&format!("@workgroup_size({tile}, {tile}, 1)")));
    }

    #[test]
    fn composite_synthesizes_the_fullscreen_vertex_count() {
        let count = edgeview_render::FULLSCREEN_VERTEX_COUNT;
        assert!(COMPOSITE_SHADER.contains(&format!("array<vec2<f32>, {count}>")));
    }
}
