//! Rendering BR Codes as QR images
//!
//! The codec only produces text. Turning it into pixels goes through the
//! [`BrCodeRenderer`] seam so front ends can plug in their own renderer.
//! With the `qrcode` feature, [`QrRenderer`] provides PNG, SVG and terminal output.

/// Turns a finished BR Code into image bytes
pub trait BrCodeRenderer {
    /// Renderer-specific failure
    type Error;

    /// Render `brcode`; the string itself stays valid whatever happens here
    fn render(&self, brcode: &str) -> Result<Vec<u8>, Self::Error>;
}

/// QR code output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QrFormat {
    /// PNG image bytes
    Png,
    /// SVG document
    Svg,
    /// Unicode blocks for terminal display
    Terminal,
}

/// Options for QR code generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrOptions {
    /// Pixels per module (PNG)
    pub scale: u32,
    /// Draw the standard four-module quiet zone around the code
    pub quiet_zone: bool,
    /// Output format
    pub format: QrFormat,
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            scale: 6,
            quiet_zone: true,
            format: QrFormat::Png,
        }
    }
}

impl QrOptions {
    /// PNG output with the given module scale
    pub fn png(scale: u32) -> Self {
        Self {
            scale,
            ..Self::default()
        }
    }

    /// SVG output
    pub fn svg() -> Self {
        Self {
            format: QrFormat::Svg,
            ..Self::default()
        }
    }

    /// Terminal output
    pub fn terminal() -> Self {
        Self {
            format: QrFormat::Terminal,
            ..Self::default()
        }
    }
}

#[cfg(feature = "qrcode")]
mod qr_impl {
    use super::*;
    use crate::RenderError;
    use image::Luma;
    use qrcode::{EcLevel, QrCode};

    /// QR renderer backed by the `qrcode` crate, error correction level M
    #[derive(Debug, Clone, Default)]
    pub struct QrRenderer {
        options: QrOptions,
    }

    impl QrRenderer {
        /// Renderer with the given options
        pub fn new(options: QrOptions) -> Self {
            Self { options }
        }

        /// Options in use
        pub fn options(&self) -> &QrOptions {
            &self.options
        }
    }

    impl BrCodeRenderer for QrRenderer {
        type Error = RenderError;

        fn render(&self, brcode: &str) -> Result<Vec<u8>, RenderError> {
            if brcode.is_empty() {
                return Err(RenderError::EmptyPayload);
            }

            let code = QrCode::with_error_correction_level(brcode.as_bytes(), EcLevel::M)
                .map_err(|e| RenderError::Qr(e.to_string()))?;

            match self.options.format {
                QrFormat::Png => generate_png(&code, &self.options),
                QrFormat::Svg => Ok(generate_svg(&code, &self.options).into_bytes()),
                QrFormat::Terminal => Ok(generate_terminal(&code).into_bytes()),
            }
        }
    }

    fn generate_png(code: &QrCode, options: &QrOptions) -> Result<Vec<u8>, RenderError> {
        let image = code
            .render::<Luma<u8>>()
            .quiet_zone(options.quiet_zone)
            .module_dimensions(options.scale, options.scale)
            .build();

        let mut bytes = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut bytes);

        image::ImageEncoder::write_image(
            encoder,
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::L8,
        )
        .map_err(|e| RenderError::Image(e.to_string()))?;

        Ok(bytes)
    }

    fn generate_svg(code: &QrCode, options: &QrOptions) -> String {
        code.render()
            .quiet_zone(options.quiet_zone)
            .dark_color(qrcode::render::svg::Color("#000000"))
            .light_color(qrcode::render::svg::Color("#ffffff"))
            .build()
    }

    fn generate_terminal(code: &QrCode) -> String {
        code.render::<char>()
            .quiet_zone(true)
            .module_dimensions(2, 1)
            .build()
    }

}

#[cfg(feature = "qrcode")]
pub use qr_impl::*;
