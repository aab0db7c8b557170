//! Validated shader module creation.
//!
//! WGSL sources are parsed and validated with naga before the module is
//! handed to the device. A broken shader is therefore a caller-visible
//! `Err` with the full diagnostic logged, never a half-built program that
//! callers have to probe for usability.

use anyhow::{Result, anyhow};
use naga::valid::{Capabilities, ValidationFlags, Validator};

/// A compiled shader module.
#[derive(Debug)]
pub struct Shader {
    pub module: wgpu::ShaderModule,
}

impl Shader {
    /// Parse, validate and compile a WGSL source.
    pub fn from_wgsl(device: &wgpu::Device, source: &str, label: &str) -> Result<Self> {
        validate_wgsl(source, label)?;
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        Ok(Self { module })
    }
}

/// Check a WGSL source without touching a device.
///
/// Logs the offending span on failure. Also used by the shader test suite
/// to verify every shipped shader on plain CI machines.
pub fn validate_wgsl(source: &str, label: &str) -> Result<()> {
    let module = match naga::front::wgsl::parse_str(source) {
        Ok(module) => module,
        Err(e) => {
            log::error!(
                "failed to compile shader {label}:\n{}",
                e.emit_to_string(source)
            );
            return Err(anyhow!("shader {label} failed to parse: {e}"));
        }
    };

    let mut validator = Validator::new(ValidationFlags::all(), Capabilities::all());
    if let Err(e) = validator.validate(&module) {
        log::error!("shader {label} failed validation: {e:?}");
        return Err(anyhow!("shader {label} failed validation: {e:?}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = "
        @vertex
        fn vs_main(@builtin(vertex_index) index: u32) -> @builtin(position) vec4<f32> {
            return vec4<f32>(0.0, 0.0, 0.0, 1.0);
        }

        @fragment
        fn fs_main() -> @location(0) vec4<f32> {
            return vec4<f32>(1.0, 0.0, 1.0, 1.0);
        }
    ";

    #[test]
    fn minimal_shader_validates() {
        validate_wgsl(MINIMAL, "minimal").expect("minimal shader should validate");
    }

    #[test]
    fn malformed_fragment_is_an_error() {
        // `retun` typo in the fragment stage
        let broken = MINIMAL.replace("return vec4<f32>(1.0", "retun vec4<f32>(1.0");
        assert!(validate_wgsl(&broken, "broken").is_err());
    }

    #[test]
    fn ill_typed_shader_is_an_error() {
        let ill_typed = "
            @fragment
            fn fs_main() -> @location(0) vec4<f32> {
                return 1;
            }
        ";
        assert!(validate_wgsl(ill_typed, "ill_typed").is_err());
    }
}
