use std::mem::size_of;
use std::ptr::copy_nonoverlapping as memcpy;

use anyhow::Result;
use bytemuck::{Pod, Zeroable};
use vulkanalia::prelude::v1_0::*;
use vulkanalia::vk::Handle;

use super::context::VulkanContext;
use super::device::VulkanDevice;
use super::error::{VkResultExt, VulkanError};
use super::instance::VulkanInstance;
use super::ledger::VulkanResource;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 2],
    pub color: [f32; 3],
}

impl Vertex {
    pub const fn new(pos: [f32; 2], color: [f32; 3]) -> Self {
        Self { pos, color }
    }

    pub fn binding_description() -> vk::VertexInputBindingDescription {
        vk::VertexInputBindingDescription::builder()
            .binding(0)
            .stride(size_of::<Vertex>() as u32)
            .input_rate(vk::VertexInputRate::VERTEX)
            .build()
    }

    pub fn attribute_descriptions() -> [vk::VertexInputAttributeDescription; 2] {
        let pos = vk::VertexInputAttributeDescription::builder()
            .binding(0)
            .location(0)
            .format(vk::Format::R32G32_SFLOAT)
            .offset(0)
            .build();
        let color = vk::VertexInputAttributeDescription::builder()
            .binding(0)
            .location(1)
            .format(vk::Format::R32G32B32_SFLOAT)
            .offset(size_of::<[f32; 2]>() as u32)
            .build();
        [pos, color]
    }
}

pub const QUAD_VERTICES: [Vertex; 4] = [
    Vertex::new([-0.5, -0.5], [1.0, 0.0, 0.0]),
    Vertex::new([0.5, -0.5], [0.0, 1.0, 0.0]),
    Vertex::new([0.5, 0.5], [0.0, 0.0, 1.0]),
    Vertex::new([-0.5, 0.5], [1.0, 1.0, 1.0]),
];

pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 3, 0];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BufferUsage {
    Vertex,
    Index,
}

impl BufferUsage {
    pub fn flags(self) -> vk::BufferUsageFlags {
        match self {
            BufferUsage::Vertex => vk::BufferUsageFlags::VERTEX_BUFFER,
            BufferUsage::Index => vk::BufferUsageFlags::INDEX_BUFFER,
        }
    }
}

/// Device-local data written once through a staging buffer.
#[derive(Copy, Clone, Debug)]
pub struct GeometryBuffer {
    pub count: u32,
    pub buffer: vk::Buffer,
    pub memory: vk::DeviceMemory,
}

impl GeometryBuffer {
    pub unsafe fn create<T: Pod>(
        instance: &VulkanInstance,
        device: &VulkanDevice,
        context: &mut VulkanContext,
        usage: BufferUsage,
        elements: &[T],
    ) -> Result<Self> {
        let bytes: &[u8] = bytemuck::cast_slice(elements);
        let size = bytes.len() as u64;

        // Staging
        let (staging_buffer, staging_buffer_memory) = create_buffer(
            instance,
            device,
            context,
            size,
            vk::BufferUsageFlags::TRANSFER_SRC,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        )?;

        let memory = device
            .vk_device
            .map_memory(staging_buffer_memory, 0, size, vk::MemoryMapFlags::empty())
            .check("map staging memory")?;
        memcpy(bytes.as_ptr(), memory.cast(), bytes.len());
        device.vk_device.unmap_memory(staging_buffer_memory);

        // Device local
        let (buffer, buffer_memory) = create_buffer(
            instance,
            device,
            context,
            size,
            vk::BufferUsageFlags::TRANSFER_DST | usage.flags(),
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
        )?;
        let geometry = Self {
            count: elements.len() as u32,
            buffer,
            memory: buffer_memory,
        };
        context.ledger.track(geometry.resource());

        copy_buffer(device, context, staging_buffer, buffer, size)?;

        device.vk_device.destroy_buffer(staging_buffer, None);
        device.vk_device.free_memory(staging_buffer_memory, None);

        Ok(geometry)
    }

    /// The buffer and its backing memory as a single ledger entry.
    pub fn resource(&self) -> VulkanResource {
        VulkanResource::Buffer {
            buffer: self.buffer,
            memory: self.memory,
        }
    }
}

/// The one static shape: a vertex buffer and the indices drawing it.
#[derive(Copy, Clone, Debug)]
pub struct Mesh {
    pub vertices: GeometryBuffer,
    pub indices: GeometryBuffer,
}

impl Mesh {
    pub unsafe fn create(
        instance: &VulkanInstance,
        device: &VulkanDevice,
        context: &mut VulkanContext,
        vertices: &[Vertex],
        indices: &[u16],
    ) -> Result<Self> {
        let vertices =
            GeometryBuffer::create(instance, device, context, BufferUsage::Vertex, vertices)?;
        let indices =
            GeometryBuffer::create(instance, device, context, BufferUsage::Index, indices)?;

        Ok(Self { vertices, indices })
    }

    pub fn index_count(&self) -> u32 {
        self.indices.count
    }
}

unsafe fn create_buffer(
    instance: &VulkanInstance,
    device: &VulkanDevice,
    context: &VulkanContext,
    size: vk::DeviceSize,
    usage: vk::BufferUsageFlags,
    properties: vk::MemoryPropertyFlags,
) -> Result<(vk::Buffer, vk::DeviceMemory)> {
    let buffer_info = vk::BufferCreateInfo::builder()
        .size(size)
        .usage(usage)
        .sharing_mode(vk::SharingMode::EXCLUSIVE);

    let buffer = device
        .vk_device
        .create_buffer(&buffer_info, None)
        .check("create buffer")?;

    let requirements = device.vk_device.get_buffer_memory_requirements(buffer);
    let memory = instance
        .vk_instance
        .get_physical_device_memory_properties(context.physical_device);
    let memory_type = find_memory_type(&memory, requirements, properties)?;

    let alloc_info = vk::MemoryAllocateInfo::builder()
        .allocation_size(requirements.size)
        .memory_type_index(memory_type);

    let buffer_memory = device
        .vk_device
        .allocate_memory(&alloc_info, None)
        .check("allocate buffer memory")?;
    device
        .vk_device
        .bind_buffer_memory(buffer, buffer_memory, 0)
        .check("bind buffer memory")?;

    Ok((buffer, buffer_memory))
}

pub fn find_memory_type(
    memory: &vk::PhysicalDeviceMemoryProperties,
    requirements: vk::MemoryRequirements,
    properties: vk::MemoryPropertyFlags,
) -> Result<u32, VulkanError> {
    (0..memory.memory_type_count)
        .find(|i| {
            let suitable = (requirements.memory_type_bits & (1 << i)) != 0;
            let memory_type = memory.memory_types[*i as usize];
            suitable && memory_type.property_flags.contains(properties)
        })
        .ok_or(VulkanError::NoMemoryType)
}

/// Copies through a one-shot command buffer and waits for the queue to drain.
unsafe fn copy_buffer(
    device: &VulkanDevice,
    context: &VulkanContext,
    source: vk::Buffer,
    destination: vk::Buffer,
    size: vk::DeviceSize,
) -> Result<()> {
    let info = vk::CommandBufferAllocateInfo::builder()
        .level(vk::CommandBufferLevel::PRIMARY)
        .command_pool(context.command_pool)
        .command_buffer_count(1);

    let command_buffer = device
        .vk_device
        .allocate_command_buffers(&info)
        .check("allocate transfer command buffer")?[0];

    let info =
        vk::CommandBufferBeginInfo::builder().flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

    device
        .vk_device
        .begin_command_buffer(command_buffer, &info)
        .check("begin transfer command buffer")?;

    let regions = vk::BufferCopy::builder().size(size);
    device
        .vk_device
        .cmd_copy_buffer(command_buffer, source, destination, &[regions]);

    device
        .vk_device
        .end_command_buffer(command_buffer)
        .check("record transfer command buffer")?;

    let command_buffers = &[command_buffer];
    let info = vk::SubmitInfo::builder().command_buffers(command_buffers);

    device
        .vk_device
        .queue_submit(context.graphics_queue, &[info], vk::Fence::null())
        .check("submit transfer")?;
    device
        .vk_device
        .queue_wait_idle(context.graphics_queue)
        .check("wait for transfer")?;

    device
        .vk_device
        .free_command_buffers(context.command_pool, &[command_buffer]);

    Ok(())
}
