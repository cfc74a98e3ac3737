use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use bytemuck::{bytes_of, Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};
use log::error;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::{Window, WindowId};

use crate::catalog::Catalog;
use crate::layout::{Layout, MARKER_RADIUS};
use crate::rig::{Pose, FOV_Y_DEGREES, Z_FAR, Z_NEAR};

/// Fraction of the panel height a showcased model is scaled to fill.
const MODEL_HEIGHT_RATIO: f32 = 0.55;

/// How far panels sit behind the models they back.
const PANEL_SETBACK: f32 = 0.05;

/// World-space depth of the ground plane under the lane.
const FLOOR_DEPTH: f32 = 60.0;

/// GPU renderer for the showcase lane.
///
/// The draw list is assembled once from the catalog: a ground plane under
/// the lane, then a backdrop panel, the item's model (or a placeholder box)
/// and a clickable marker sphere per item. Only the per-object transforms
/// change afterwards, rewritten when the layout is re-derived from a
/// resized window.
pub struct Renderer {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    depth: DepthBuffer,
    pipeline: wgpu::RenderPipeline,
    global_buffer: wgpu::Buffer,
    global_bind_group: wgpu::BindGroup,
    instances: Vec<Instance>,
}

impl Renderer {
    /// Initializes the GPU surface and builds the draw list for `catalog`,
    /// loading item models relative to `base_dir`.
    pub async fn new(
        window: Arc<Window>,
        catalog: &Catalog,
        layout: &Layout,
        base_dir: &Path,
    ) -> Result<Self> {
        let size = window.inner_size();
        if size.width == 0 || size.height == 0 {
            return Err(anyhow!("window has zero area"));
        }

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: Default::default(),
            backend_options: Default::default(),
        });
        let surface = instance.create_surface(Arc::clone(&window))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to acquire GPU adapter")?;

        let device_descriptor = wgpu::DeviceDescriptor {
            label: Some("showcase-device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: Default::default(),
            trace: Default::default(),
        };
        let (device, queue) = adapter
            .request_device(&device_descriptor)
            .await
            .context("failed to create GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|format| format.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            // Fifo keeps the glide pacing tied to vsync.
            present_mode: wgpu::PresentMode::Fifo,
            desired_maximum_frame_latency: 2,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let depth = DepthBuffer::create(&device, config.width, config.height);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("showcase-shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER.into()),
        });

        let global_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("global-bind-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: Some(
                        std::num::NonZeroU64::new(std::mem::size_of::<GlobalUniform>() as u64)
                            .ok_or_else(|| anyhow!("zero-sized global uniform"))?,
                    ),
                },
                count: None,
            }],
        });

        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("object-bind-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: Some(
                        std::num::NonZeroU64::new(std::mem::size_of::<ObjectConstants>() as u64)
                            .ok_or_else(|| anyhow!("zero-sized object uniform"))?,
                    ),
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("showcase-pipeline-layout"),
            bind_group_layouts: &[&global_layout, &object_layout],
            push_constant_ranges: &[],
        });

        let global_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("global-uniform"),
            size: std::mem::size_of::<GlobalUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let global_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("global-bind-group"),
            layout: &global_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: global_buffer.as_entire_binding(),
            }],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("showcase-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: (6 * std::mem::size_of::<f32>()) as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[
                        wgpu::VertexAttribute {
                            format: wgpu::VertexFormat::Float32x3,
                            offset: 0,
                            shader_location: 0,
                        },
                        wgpu::VertexAttribute {
                            format: wgpu::VertexFormat::Float32x3,
                            offset: (3 * std::mem::size_of::<f32>()) as u64,
                            shader_location: 1,
                        },
                    ],
                }],
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DepthBuffer::FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            multiview: None,
            cache: None,
        });

        let instances = build_instances(&device, &object_layout, catalog, base_dir);

        let mut renderer = Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            depth,
            pipeline,
            global_buffer,
            global_bind_group,
            instances,
        };
        renderer.set_layout(layout);
        Ok(renderer)
    }

    pub fn window_id(&self) -> WindowId {
        self.window.id()
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Resizes the swap chain to match the new dimensions.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.depth = DepthBuffer::create(&self.device, new_size.width, new_size.height);
    }

    /// Re-derives every object transform from `layout` and rewrites the
    /// per-object uniforms. Called after the viewport changes, so the
    /// panels keep filling exactly one frustum width.
    pub fn set_layout(&mut self, layout: &Layout) {
        for instance in &mut self.instances {
            let model = instance.placement.model_matrix(layout);
            let normal = Mat3::from_mat4(model).inverse().transpose();
            let constants = ObjectConstants {
                model: model.to_cols_array_2d(),
                normal: mat3_to_3x4(normal),
                color: instance.color.extend(1.0).into(),
            };
            self.queue
                .write_buffer(&instance.buffer, 0, bytes_of(&constants));
        }
    }

    /// Draws one frame of the lane as seen from `pose`.
    pub fn render(&mut self, pose: &Pose) -> Result<(), wgpu::SurfaceError> {
        let aspect = self.config.width as f32 / self.config.height.max(1) as f32;
        let view_matrix = Mat4::look_at_rh(pose.eye, pose.target, Vec3::Y);
        let projection = Mat4::perspective_rh(FOV_Y_DEGREES.to_radians(), aspect, Z_NEAR, Z_FAR);
        // A headlight slightly above the eye follows the camera through
        // every glide.
        let light_position = pose.eye + Vec3::new(0.0, 2.0, 0.0);
        let uniform = GlobalUniform {
            view_proj: (projection * view_matrix).to_cols_array_2d(),
            camera_position: pose.eye.extend(1.0).into(),
            light_position: light_position.extend(1.0).into(),
            light_color: Vec3::ONE.extend(1.0).into(),
        };
        self.queue
            .write_buffer(&self.global_buffer, 0, bytes_of(&uniform));

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("showcase-encoder"),
            });

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("main-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: 0.02,
                        g: 0.02,
                        b: 0.04,
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.global_bind_group, &[]);

        for instance in &self.instances {
            pass.set_vertex_buffer(0, instance.mesh.vertex.slice(..));
            pass.set_index_buffer(instance.mesh.index.slice(..), wgpu::IndexFormat::Uint32);
            pass.set_bind_group(1, &instance.bind_group, &[]);
            pass.draw_indexed(0..instance.mesh.index_count, 0, 0..1);
        }

        drop(pass); // explicit to satisfy lifetimes on some backends
        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

/// How one drawn object derives its transform from the current layout.
enum Placement {
    Panel { index: usize },
    Model { index: usize, fit: MeshFit },
    Marker { index: usize },
    Floor { count: usize },
}

impl Placement {
    fn model_matrix(&self, layout: &Layout) -> Mat4 {
        match self {
            Placement::Floor { count } => {
                let center = layout.overview_center(*count);
                // Overhang one pitch past each end of the lane.
                let length = layout.offset_x(count.saturating_sub(1))
                    + 2.0 * (layout.span + layout.gap);
                Mat4::from_translation(Vec3::new(
                    center.x,
                    -layout.view_height / 2.0,
                    0.0,
                )) * Mat4::from_scale(Vec3::new(length, 1.0, FLOOR_DEPTH))
            }
            Placement::Panel { index } => {
                let position = layout.item_position(*index) - Vec3::new(0.0, 0.0, PANEL_SETBACK);
                Mat4::from_translation(position)
                    * Mat4::from_scale(Vec3::new(layout.span, layout.view_height, 1.0))
            }
            Placement::Model { index, fit } => {
                let scale = layout.view_height * MODEL_HEIGHT_RATIO / fit.extent;
                Mat4::from_translation(layout.item_position(*index))
                    * Mat4::from_scale(Vec3::splat(scale))
                    * Mat4::from_translation(-fit.center)
            }
            Placement::Marker { index } => {
                Mat4::from_translation(layout.marker_position(*index))
                    * Mat4::from_scale(Vec3::splat(MARKER_RADIUS))
            }
        }
    }
}

struct Instance {
    mesh: Arc<MeshBuffers>,
    placement: Placement,
    color: Vec3,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

fn build_instances(
    device: &wgpu::Device,
    object_layout: &wgpu::BindGroupLayout,
    catalog: &Catalog,
    base_dir: &Path,
) -> Vec<Instance> {
    let panel = Arc::new(MeshBuffers::upload(device, &panel_mesh(), "panel"));
    let marker = Arc::new(MeshBuffers::upload(device, &sphere_mesh(24, 16), "marker"));
    let fallback = Arc::new(MeshBuffers::upload(device, &box_mesh(), "fallback-box"));
    let floor = Arc::new(MeshBuffers::upload(device, &floor_mesh(), "floor"));
    let fallback_fit = MeshFit::UNIT;

    let mut missing: HashSet<PathBuf> = HashSet::new();
    let mut instances = Vec::with_capacity(catalog.len() * 3 + 1);

    instances.push(Instance::create(
        device,
        object_layout,
        floor,
        Placement::Floor {
            count: catalog.len(),
        },
        Vec3::splat(0.12),
    ));

    for (index, item) in catalog.items().iter().enumerate() {
        let backdrop = item.accent * 0.35;
        instances.push(Instance::create(
            device,
            object_layout,
            Arc::clone(&panel),
            Placement::Panel { index },
            backdrop,
        ));

        let (mesh, fit) = match &item.model {
            Some(relative) => {
                let path = base_dir.join(relative);
                match load_showcase_mesh(&path) {
                    Ok((mesh, fit)) => (Arc::new(MeshBuffers::upload(device, &mesh, relative)), fit),
                    Err(err) => {
                        if missing.insert(path.clone()) {
                            error!("failed to load model {}: {err:?}", path.display());
                        }
                        (Arc::clone(&fallback), fallback_fit)
                    }
                }
            }
            None => (Arc::clone(&fallback), fallback_fit),
        };
        instances.push(Instance::create(
            device,
            object_layout,
            mesh,
            Placement::Model { index, fit },
            item.accent,
        ));

        instances.push(Instance::create(
            device,
            object_layout,
            Arc::clone(&marker),
            Placement::Marker { index },
            item.accent,
        ));
    }

    instances
}

impl Instance {
    fn create(
        device: &wgpu::Device,
        object_layout: &wgpu::BindGroupLayout,
        mesh: Arc<MeshBuffers>,
        placement: Placement,
        color: Vec3,
    ) -> Self {
        // Written with real transforms by `set_layout` before the first frame.
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("object-uniform"),
            size: std::mem::size_of::<ObjectConstants>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: object_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("object-bind-group"),
        });
        Self {
            mesh,
            placement,
            color,
            buffer,
            bind_group,
        }
    }
}

/// Interleaved position+normal triangle mesh, ready for upload.
pub struct Mesh {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

/// Bounding information used to normalize a loaded model into panel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshFit {
    pub center: Vec3,
    /// Largest axis-aligned extent; never zero.
    pub extent: f32,
}

impl MeshFit {
    const UNIT: Self = Self {
        center: Vec3::ZERO,
        extent: 1.0,
    };

    fn from_positions(positions: &[f32]) -> Self {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for chunk in positions.chunks_exact(3) {
            let point = Vec3::new(chunk[0], chunk[1], chunk[2]);
            min = min.min(point);
            max = max.max(point);
        }
        if !min.is_finite() || !max.is_finite() {
            return Self::UNIT;
        }
        let size = max - min;
        Self {
            center: (min + max) / 2.0,
            extent: size.max_element().max(1e-6),
        }
    }
}

/// Loads an OBJ model and computes its normalization bounds.
///
/// Models without normals get flat per-face normals, which costs vertex
/// sharing but keeps the lighting honest.
pub fn load_showcase_mesh(path: &Path) -> Result<(Mesh, MeshFit)> {
    let options = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    };
    let (models, _materials) = tobj::load_obj(path, &options)
        .with_context(|| format!("failed to read OBJ file {}", path.display()))?;
    if models.is_empty() {
        return Err(anyhow!("{} contains no geometry", path.display()));
    }

    let mut positions = Vec::new();
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for model in &models {
        let mesh = &model.mesh;
        let base = (vertices.len() / 6) as u32;
        positions.extend_from_slice(&mesh.positions);

        if mesh.normals.len() == mesh.positions.len() {
            for (position, normal) in mesh
                .positions
                .chunks_exact(3)
                .zip(mesh.normals.chunks_exact(3))
            {
                vertices.extend_from_slice(position);
                vertices.extend_from_slice(normal);
            }
            indices.extend(mesh.indices.iter().map(|&i| base + i));
        } else {
            // Unshare vertices and assign the face normal to each corner.
            for triangle in mesh.indices.chunks_exact(3) {
                let corner = |i: u32| {
                    let at = i as usize * 3;
                    Vec3::new(
                        mesh.positions[at],
                        mesh.positions[at + 1],
                        mesh.positions[at + 2],
                    )
                };
                let (a, b, c) = (corner(triangle[0]), corner(triangle[1]), corner(triangle[2]));
                let normal = (b - a).cross(c - a).normalize_or_zero();
                for point in [a, b, c] {
                    let next = (vertices.len() / 6) as u32;
                    vertices.extend_from_slice(&[
                        point.x, point.y, point.z, normal.x, normal.y, normal.z,
                    ]);
                    indices.push(next);
                }
            }
        }
    }

    let fit = MeshFit::from_positions(&positions);
    Ok((Mesh { vertices, indices }, fit))
}

/// Unit quad in the xy plane, facing +z, centered on the origin.
fn panel_mesh() -> Mesh {
    let h = 0.5;
    #[rustfmt::skip]
    let vertices = vec![
        -h, -h, 0.0, 0.0, 0.0, 1.0,
         h, -h, 0.0, 0.0, 0.0, 1.0,
         h,  h, 0.0, 0.0, 0.0, 1.0,
        -h,  h, 0.0, 0.0, 0.0, 1.0,
    ];
    Mesh {
        vertices,
        indices: vec![0, 1, 2, 0, 2, 3],
    }
}

/// Unit quad in the xz plane, facing +y: the ground under the lane.
fn floor_mesh() -> Mesh {
    let h = 0.5;
    #[rustfmt::skip]
    let vertices = vec![
        -h, 0.0, -h, 0.0, 1.0, 0.0,
         h, 0.0, -h, 0.0, 1.0, 0.0,
         h, 0.0,  h, 0.0, 1.0, 0.0,
        -h, 0.0,  h, 0.0, 1.0, 0.0,
    ];
    Mesh {
        vertices,
        indices: vec![0, 2, 1, 0, 3, 2],
    }
}

/// Unit-radius UV sphere.
fn sphere_mesh(slices: u32, stacks: u32) -> Mesh {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for stack in 0..=stacks {
        let phi = std::f32::consts::PI * stack as f32 / stacks as f32;
        for slice in 0..=slices {
            let theta = std::f32::consts::TAU * slice as f32 / slices as f32;
            let normal = Vec3::new(
                phi.sin() * theta.cos(),
                phi.cos(),
                phi.sin() * theta.sin(),
            );
            vertices.extend_from_slice(&[
                normal.x, normal.y, normal.z, normal.x, normal.y, normal.z,
            ]);
        }
    }

    let ring = slices + 1;
    for stack in 0..stacks {
        for slice in 0..slices {
            let a = stack * ring + slice;
            let b = a + ring;
            indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
        }
    }

    Mesh { vertices, indices }
}

/// Unit cube used when an item has no model or the model failed to load.
fn box_mesh() -> Mesh {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    let faces: [(Vec3, Vec3, Vec3); 6] = [
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
    ];
    for (normal, right, up) in faces {
        let base = (vertices.len() / 6) as u32;
        for (u, v) in [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)] {
            let point = normal * 0.5 + right * u + up * v;
            vertices.extend_from_slice(&[
                point.x, point.y, point.z, normal.x, normal.y, normal.z,
            ]);
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    Mesh { vertices, indices }
}

struct MeshBuffers {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    index_count: u32,
}

impl MeshBuffers {
    fn upload(device: &wgpu::Device, mesh: &Mesh, label: &str) -> Self {
        let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-vertices")),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-indices")),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex,
            index,
            index_count: mesh.indices.len() as u32,
        }
    }
}

struct DepthBuffer {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl DepthBuffer {
    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

    fn create(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth-texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

fn mat3_to_3x4(matrix: Mat3) -> [[f32; 4]; 3] {
    let cols = matrix.to_cols_array();
    [
        [cols[0], cols[1], cols[2], 0.0],
        [cols[3], cols[4], cols[5], 0.0],
        [cols[6], cols[7], cols[8], 0.0],
    ]
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct GlobalUniform {
    view_proj: [[f32; 4]; 4],
    camera_position: [f32; 4],
    light_position: [f32; 4],
    light_color: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct ObjectConstants {
    model: [[f32; 4]; 4],
    normal: [[f32; 4]; 3],
    color: [f32; 4],
}

const SHADER: &str = r#"
struct GlobalUniform {
    view_proj: mat4x4<f32>,
    camera_position: vec4<f32>,
    light_position: vec4<f32>,
    light_color: vec4<f32>,
}

struct ObjectConstants {
    model: mat4x4<f32>,
    normal: mat3x4<f32>,
    color: vec4<f32>,
}

@group(0) @binding(0)
var<uniform> globals: GlobalUniform;

@group(1) @binding(0)
var<uniform> object: ObjectConstants;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world_position = object.model * vec4<f32>(input.position, 1.0);
    out.position = globals.view_proj * world_position;
    out.world_position = world_position.xyz;

    let world_normal = mat3x3<f32>(
        object.normal[0].xyz,
        object.normal[1].xyz,
        object.normal[2].xyz
    ) * input.normal;

    out.normal = normalize(world_normal);
    return out;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let light_dir = normalize(globals.light_position.xyz - input.world_position);
    let normal = normalize(input.normal);
    let diffuse = max(dot(normal, light_dir), 0.0);
    let ambient = 0.18;
    let lit = (ambient + diffuse * globals.light_color.w)
        * object.color.rgb * globals.light_color.xyz;
    return vec4<f32>(lit, object.color.a);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn sphere_normals_are_unit_length() {
        let mesh = sphere_mesh(12, 8);
        for vertex in mesh.vertices.chunks_exact(6) {
            let normal = Vec3::new(vertex[3], vertex[4], vertex[5]);
            assert!((normal.length() - 1.0).abs() < 1e-4);
        }
        assert_eq!(mesh.indices.len() as u32 % 3, 0);
    }

    #[test]
    fn box_mesh_has_six_faces() {
        let mesh = box_mesh();
        assert_eq!(mesh.vertices.len(), 24 * 6);
        assert_eq!(mesh.indices.len(), 36);
    }

    #[test]
    fn floor_mesh_faces_up() {
        let mesh = floor_mesh();
        for vertex in mesh.vertices.chunks_exact(6) {
            assert_eq!(vertex[1], 0.0);
            assert_eq!(Vec3::new(vertex[3], vertex[4], vertex[5]), Vec3::Y);
        }
    }

    #[test]
    fn floor_spans_the_whole_lane() {
        let layout = Layout::new(5.0, 1.0);
        let matrix = Placement::Floor { count: 3 }.model_matrix(&layout);
        let center = matrix.transform_point3(Vec3::ZERO);
        assert_eq!(center, Vec3::new(6.0, -layout.view_height / 2.0, 0.0));
        // Half-extent reaches past the last item's offset.
        let edge = matrix.transform_point3(Vec3::new(0.5, 0.0, 0.0));
        assert!(edge.x > layout.offset_x(2));
    }

    #[test]
    fn mesh_fit_centers_the_bounding_box() {
        let fit = MeshFit::from_positions(&[0.0, 0.0, 0.0, 4.0, 2.0, 0.0]);
        assert_eq!(fit.center, Vec3::new(2.0, 1.0, 0.0));
        assert_eq!(fit.extent, 4.0);
    }

    #[test]
    fn loads_an_obj_without_normals() {
        let mut file = tempfile::Builder::new().suffix(".obj").tempfile().unwrap();
        writeln!(file, "v 0 0 0\nv 2 0 0\nv 0 2 0\nf 1 2 3").unwrap();
        file.flush().unwrap();

        let (mesh, fit) = load_showcase_mesh(file.path()).unwrap();
        assert_eq!(mesh.indices.len(), 3);
        // Flat normal of a triangle in the xy plane points along z.
        let normal = Vec3::new(mesh.vertices[3], mesh.vertices[4], mesh.vertices[5]);
        assert!((normal.z.abs() - 1.0).abs() < 1e-5);
        assert_eq!(fit.extent, 2.0);
    }

    #[test]
    fn missing_obj_is_an_error() {
        assert!(load_showcase_mesh(Path::new("does-not-exist.obj")).is_err());
    }
}
