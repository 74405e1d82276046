//! WGSL sources for the scene, bloom and composite passes.

/// Plane and point-light marker, lit with Blinn-Phong and flat normals.
pub(crate) const SCENE_SHADER: &str = r#"
struct SceneUniform {
    view_proj: mat4x4<f32>,
    model: mat4x4<f32>,
    camera_position: vec4<f32>,
    point_position: vec4<f32>,
    point_color: vec4<f32>,
    point_decay: vec4<f32>,
    directional: vec4<f32>,
    directional_color: vec4<f32>,
    ambient: vec4<f32>,
    specular: vec4<f32>,
    helper: vec4<f32>,
}

@group(0) @binding(0)
var<uniform> scene: SceneUniform;

const RECIPROCAL_PI: f32 = 0.3183098862;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) color: vec3<f32>,
}

@vertex
fn vs_mesh(@location(0) position: vec3<f32>, @location(1) color: vec3<f32>) -> VertexOutput {
    var out: VertexOutput;
    let world = scene.model * vec4<f32>(position, 1.0);
    out.position = scene.view_proj * world;
    out.world_pos = world.xyz;
    out.color = color;
    return out;
}

fn distance_falloff(dist: f32, cutoff: f32, decay: f32) -> f32 {
    var falloff = 1.0 / max(pow(dist, decay), 0.01);
    if cutoff > 0.0 {
        let ratio = dist / cutoff;
        let window = clamp(1.0 - ratio * ratio * ratio * ratio, 0.0, 1.0);
        falloff = falloff * window * window;
    }
    return falloff;
}

fn blinn_phong(light_dir: vec3<f32>, view_dir: vec3<f32>, normal: vec3<f32>) -> vec3<f32> {
    let half_dir = normalize(light_dir + view_dir);
    let dot_nh = clamp(dot(normal, half_dir), 0.0, 1.0);
    let dot_vh = clamp(dot(view_dir, half_dir), 0.0, 1.0);
    let specular = scene.specular.rgb;
    let shininess = scene.specular.w;
    let fresnel = specular + (vec3<f32>(1.0) - specular) * pow(1.0 - dot_vh, 5.0);
    let distribution = RECIPROCAL_PI * (shininess * 0.5 + 1.0) * pow(dot_nh, shininess);
    return fresnel * 0.25 * distribution;
}

@fragment
fn fs_mesh(in: VertexOutput) -> @location(0) vec4<f32> {
    let view_dir = normalize(scene.camera_position.xyz - in.world_pos);
    var normal = normalize(cross(dpdx(in.world_pos), dpdy(in.world_pos)));
    // Both faces are lit: the normal always faces the viewer.
    if dot(normal, view_dir) < 0.0 {
        normal = -normal;
    }
    let diffuse = in.color * RECIPROCAL_PI;

    let to_light = scene.point_position.xyz - in.world_pos;
    let light_distance = length(to_light);
    let point_dir = to_light / max(light_distance, 0.0001);
    let point_radiance = scene.point_color.rgb * scene.point_color.w
        * distance_falloff(light_distance, scene.point_position.w, scene.point_decay.x);
    let point_irradiance = point_radiance * max(dot(normal, point_dir), 0.0);

    let sun_dir = scene.directional.xyz;
    let sun_irradiance = scene.directional_color.rgb * scene.directional.w
        * max(dot(normal, sun_dir), 0.0);

    var color = scene.ambient.rgb * scene.ambient.w * diffuse;
    color += point_irradiance * (diffuse + blinn_phong(point_dir, view_dir, normal));
    color += sun_irradiance * (diffuse + blinn_phong(sun_dir, view_dir, normal));
    return vec4<f32>(color, 1.0);
}

@vertex
fn vs_helper(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    let world = scene.helper.xyz + position * scene.helper.w;
    return scene.view_proj * vec4<f32>(world, 1.0);
}

@fragment
fn fs_helper() -> @location(0) vec4<f32> {
    return vec4<f32>(scene.point_color.rgb, 1.0);
}
"#;

pub(crate) const FULLSCREEN_VERTEX: &str = r#"
struct FullscreenOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_fullscreen(@builtin(vertex_index) idx: u32) -> FullscreenOutput {
    let uv = vec2<f32>(f32((idx << 1u) & 2u), f32(idx & 2u));
    var out: FullscreenOutput;
    out.position = vec4<f32>(uv * 2.0 - 1.0, 0.0, 1.0);
    out.uv = vec2<f32>(uv.x, 1.0 - uv.y);
    return out;
}
"#;

/// Luminance high-pass and separable Gaussian blur.
pub(crate) const BLOOM_PASSES: &str = r#"
struct PassParams {
    direction: vec2<f32>,
    texel_size: vec2<f32>,
    kernel_radius: f32,
    threshold: f32,
    smooth_width: f32,
    _padding: f32,
}

@group(0) @binding(0) var<uniform> params: PassParams;
@group(0) @binding(1) var source: texture_2d<f32>;
@group(0) @binding(2) var source_sampler: sampler;

@fragment
fn fs_bright(in: FullscreenOutput) -> @location(0) vec4<f32> {
    let texel = textureSampleLevel(source, source_sampler, in.uv, 0.0);
    let luma = dot(texel.rgb, vec3<f32>(0.299, 0.587, 0.114));
    let alpha = smoothstep(params.threshold, params.threshold + params.smooth_width, luma);
    return mix(vec4<f32>(0.0), texel, alpha);
}

fn gaussian_pdf(x: f32, sigma: f32) -> f32 {
    return 0.39894 * exp(-0.5 * x * x / (sigma * sigma)) / sigma;
}

@fragment
fn fs_blur(in: FullscreenOutput) -> @location(0) vec4<f32> {
    let sigma = params.kernel_radius;
    let texel_step = params.direction * params.texel_size;
    var weight_sum = gaussian_pdf(0.0, sigma);
    var sum = textureSampleLevel(source, source_sampler, in.uv, 0.0).rgb * weight_sum;
    for (var i = 1; i < 16; i = i + 1) {
        let x = f32(i);
        if x >= sigma {
            break;
        }
        let weight = gaussian_pdf(x, sigma);
        let offset = texel_step * x;
        let left = textureSampleLevel(source, source_sampler, in.uv - offset, 0.0).rgb;
        let right = textureSampleLevel(source, source_sampler, in.uv + offset, 0.0).rgb;
        sum += (left + right) * weight;
        weight_sum += 2.0 * weight;
    }
    return vec4<f32>(sum / weight_sum, 1.0);
}
"#;

/// Adds the weighted blur levels on top of the rendered scene.
pub(crate) const COMPOSITE_PASS: &str = r#"
struct CompositeParams {
    weights: vec4<f32>,
    last_weight: vec4<f32>,
}

@group(0) @binding(0) var<uniform> composite: CompositeParams;
@group(0) @binding(1) var scene_color: texture_2d<f32>;
@group(0) @binding(2) var level0: texture_2d<f32>;
@group(0) @binding(3) var level1: texture_2d<f32>;
@group(0) @binding(4) var level2: texture_2d<f32>;
@group(0) @binding(5) var level3: texture_2d<f32>;
@group(0) @binding(6) var level4: texture_2d<f32>;
@group(0) @binding(7) var linear_sampler: sampler;

@fragment
fn fs_composite(in: FullscreenOutput) -> @location(0) vec4<f32> {
    let base = textureSampleLevel(scene_color, linear_sampler, in.uv, 0.0).rgb;
    var bloom = textureSampleLevel(level0, linear_sampler, in.uv, 0.0).rgb * composite.weights.x;
    bloom += textureSampleLevel(level1, linear_sampler, in.uv, 0.0).rgb * composite.weights.y;
    bloom += textureSampleLevel(level2, linear_sampler, in.uv, 0.0).rgb * composite.weights.z;
    bloom += textureSampleLevel(level3, linear_sampler, in.uv, 0.0).rgb * composite.weights.w;
    bloom += textureSampleLevel(level4, linear_sampler, in.uv, 0.0).rgb * composite.last_weight.x;
    return vec4<f32>(base + bloom, 1.0);
}
"#;
