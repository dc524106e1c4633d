use image::GrayImage;
use serde::{Deserialize, Serialize};

/// One grid cell of the floorplan and its summed density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub row: u32,
    pub col: u32,
    pub intensity: u64,
    /// Pixel bounds `[x1, y1, x2, y2)`.
    pub bounds: [u32; 4],
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneReport {
    /// Summed grayscale intensity divided by 255. A coarse, independent
    /// estimate that is not expected to match the unique track count.
    pub total_visitors_from_density: u64,
    /// Highest-intensity cells, most intense first.
    pub popular_zones: Vec<Zone>,
}

/// Ranks grid cells of a rendered grayscale density layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneAnalyzer {
    grid_size: u32,
    top_n: usize,
}

impl Default for ZoneAnalyzer {
    fn default() -> Self {
        Self::new(5, 5)
    }
}

impl ZoneAnalyzer {
    pub fn new(grid_size: u32, top_n: usize) -> Self {
        Self {
            grid_size: grid_size.max(1),
            top_n,
        }
    }

    pub fn analyze(&self, density: &GrayImage) -> ZoneReport {
        let (width, height) = density.dimensions();
        let g = self.grid_size;
        let (cell_w, cell_h) = (width / g, height / g);

        let mut zones = Vec::with_capacity((g * g) as usize);
        for row in 0..g {
            let y1 = row * cell_h;
            let y2 = if row + 1 < g { (row + 1) * cell_h } else { height };
            for col in 0..g {
                let x1 = col * cell_w;
                let x2 = if col + 1 < g { (col + 1) * cell_w } else { width };
                let mut intensity = 0u64;
                for y in y1..y2 {
                    for x in x1..x2 {
                        intensity += density.get_pixel(x, y)[0] as u64;
                    }
                }
                zones.push(Zone {
                    row,
                    col,
                    intensity,
                    bounds: [x1, y1, x2, y2],
                });
            }
        }

        let total: u64 = zones.iter().map(|z| z.intensity).sum();
        // stable: equal cells keep row-major order
        zones.sort_by(|a, b| b.intensity.cmp(&a.intensity));
        zones.truncate(self.top_n);

        ZoneReport {
            total_visitors_from_density: total / 255,
            popular_zones: zones,
        }
    }
}
