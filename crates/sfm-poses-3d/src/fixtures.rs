//! Test fixtures shared by the model reader tests.

use std::path::Path;

/// Little endian byte sink used to build binary model fixtures.
#[derive(Default)]
pub struct Le(pub Vec<u8>);

impl Le {
    pub fn u32(mut self, v: u32) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }
    pub fn i32(mut self, v: i32) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }
    pub fn u64(mut self, v: u64) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }
    pub fn i64(mut self, v: i64) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }
    pub fn f64s(mut self, vs: &[f64]) -> Self {
        for v in vs {
            self.0.extend_from_slice(&v.to_le_bytes());
        }
        self
    }
    pub fn bytes(mut self, b: &[u8]) -> Self {
        self.0.extend_from_slice(b);
        self
    }
}

/// A two camera, two image, one point model in COLMAP binary layout.
pub fn write_binary_model(dir: &Path) -> std::io::Result<()> {
    let cameras = Le::default()
        .u64(2)
        .u32(1)
        .i32(0)
        .u64(640)
        .u64(480)
        .f64s(&[500.0, 320.0, 240.0])
        .u32(2)
        .i32(1)
        .u64(1280)
        .u64(720)
        .f64s(&[900.0, 901.0, 640.0, 360.0]);
    std::fs::write(dir.join("cameras.bin"), cameras.0)?;

    let half_sqrt2 = std::f64::consts::FRAC_1_SQRT_2;
    let images = Le::default()
        .u64(2)
        .u32(3)
        .f64s(&[1.0, 0.0, 0.0, 0.0])
        .f64s(&[0.0, 0.0, -2.0])
        .u32(1)
        .bytes(b"b.jpg\0")
        .u64(2)
        .f64s(&[1.0, 2.0])
        .i64(-1)
        .f64s(&[3.0, 4.0])
        .i64(11)
        .u32(5)
        .f64s(&[half_sqrt2, 0.0, 0.0, half_sqrt2])
        .f64s(&[1.0, 0.0, 0.0])
        .u32(2)
        .bytes(b"a.jpg\0")
        .u64(0);
    std::fs::write(dir.join("images.bin"), images.0)?;

    let points = Le::default()
        .u64(1)
        .u64(11)
        .f64s(&[0.1, 0.2, 0.3])
        .bytes(&[10, 20, 30])
        .f64s(&[0.25])
        .u64(1)
        .u32(3)
        .u32(1);
    std::fs::write(dir.join("points3D.bin"), points.0)?;

    Ok(())
}
