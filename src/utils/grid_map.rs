// Occupancy grid map for the planners
// Obstacles are inflated by the robot radius when they are inserted, so a
// free cell means the robot centre fits there.

extern crate nalgebra as na;

use crate::common::{OccupancyMap, Point2D, RoboticsError, RoboticsResult};

pub struct GridMap {
    pub resolution: f64,
    pub robot_radius: f64,
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub x_width: usize,
    pub y_width: usize,
    obstacle_map: na::DMatrix<bool>,
}

impl GridMap {
    /// Empty map covering `[min_x, max_x) x [min_y, max_y)`
    pub fn new(
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
        resolution: f64,
        robot_radius: f64,
    ) -> RoboticsResult<Self> {
        if resolution <= 0.0 {
            return Err(RoboticsError::InvalidParameter(
                "grid resolution must be positive".to_string(),
            ));
        }
        if max_x <= min_x || max_y <= min_y {
            return Err(RoboticsError::InvalidParameter(format!(
                "empty map bounds x: [{}, {}) y: [{}, {})",
                min_x, max_x, min_y, max_y
            )));
        }

        let x_width = ((max_x - min_x) / resolution - 1e-9).ceil() as usize;
        let y_width = ((max_y - min_y) / resolution - 1e-9).ceil() as usize;

        Ok(GridMap {
            resolution,
            robot_radius: robot_radius.max(0.0),
            min_x,
            min_y,
            max_x,
            max_y,
            x_width,
            y_width,
            obstacle_map: na::DMatrix::from_element(x_width, y_width, false),
        })
    }

    /// Map whose bounds are the extent of the obstacle points, which are
    /// typically a closed boundary wall plus interior obstacles
    pub fn from_obstacles(
        ox: &[f64],
        oy: &[f64],
        resolution: f64,
        robot_radius: f64,
    ) -> RoboticsResult<Self> {
        if ox.len() != oy.len() || ox.is_empty() {
            return Err(RoboticsError::InvalidParameter(
                "obstacle coordinates must be non-empty and of equal length".to_string(),
            ));
        }
        let min_x = ox.iter().fold(f64::INFINITY, |a, &b| a.min(b)).round();
        let min_y = oy.iter().fold(f64::INFINITY, |a, &b| a.min(b)).round();
        let max_x = ox.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b)).round();
        let max_y = oy.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b)).round();

        let mut map = Self::new(min_x, min_y, max_x + resolution, max_y + resolution, resolution, robot_radius)?;
        for (&x, &y) in ox.iter().zip(oy.iter()) {
            map.add_obstacle_point(x, y);
        }
        Ok(map)
    }

    /// Mark an obstacle point, inflated by the robot radius
    pub fn add_obstacle_point(&mut self, x: f64, y: f64) {
        self.add_rectangle(x, y, x, y);
    }

    /// Mark an axis-aligned rectangular obstacle, inflated by the robot radius
    pub fn add_rectangle(&mut self, x0: f64, y0: f64, x1: f64, y1: f64) {
        let (lx, hx) = (x0.min(x1), x0.max(x1));
        let (ly, hy) = (y0.min(y1), y0.max(y1));
        let r = self.robot_radius;

        let ix_lo = self.clamp_index(lx - r - self.min_x, self.x_width);
        let ix_hi = self.clamp_index(hx + r - self.min_x, self.x_width);
        let iy_lo = self.clamp_index(ly - r - self.min_y, self.y_width);
        let iy_hi = self.clamp_index(hy + r - self.min_y, self.y_width);

        for ix in ix_lo..=ix_hi {
            let cx = self.calc_x_position(ix);
            for iy in iy_lo..=iy_hi {
                let cy = self.calc_y_position(iy);
                let dx = (lx - cx).max(0.0).max(cx - hx);
                let dy = (ly - cy).max(0.0).max(cy - hy);
                // cell centre within the inflated rectangle, or the cell
                // containing the obstacle itself
                let contains = cx + 0.5 * self.resolution >= lx
                    && cx - 0.5 * self.resolution <= hx
                    && cy + 0.5 * self.resolution >= ly
                    && cy - 0.5 * self.resolution <= hy;
                if contains || dx.hypot(dy) <= r {
                    self.obstacle_map[(ix, iy)] = true;
                }
            }
        }
    }

    fn clamp_index(&self, offset: f64, width: usize) -> usize {
        let i = (offset / self.resolution).floor();
        if i < 0.0 {
            0
        } else {
            (i as usize).min(width - 1)
        }
    }

    pub fn calc_x_index(&self, x: f64) -> Option<usize> {
        let i = ((x - self.min_x) / self.resolution).floor();
        (i >= 0.0 && (i as usize) < self.x_width).then(|| i as usize)
    }

    pub fn calc_y_index(&self, y: f64) -> Option<usize> {
        let i = ((y - self.min_y) / self.resolution).floor();
        (i >= 0.0 && (i as usize) < self.y_width).then(|| i as usize)
    }

    /// Centre of column `ix`
    pub fn calc_x_position(&self, ix: usize) -> f64 {
        (ix as f64 + 0.5) * self.resolution + self.min_x
    }

    /// Centre of row `iy`
    pub fn calc_y_position(&self, iy: usize) -> f64 {
        (iy as f64 + 0.5) * self.resolution + self.min_y
    }

    pub fn is_occupied(&self, ix: usize, iy: usize) -> bool {
        ix >= self.x_width || iy >= self.y_width || self.obstacle_map[(ix, iy)]
    }

    /// Centres of all occupied cells, for plotting
    pub fn occupied_cells(&self) -> (Vec<f64>, Vec<f64>) {
        let mut ox = Vec::new();
        let mut oy = Vec::new();
        for ix in 0..self.x_width {
            for iy in 0..self.y_width {
                if self.obstacle_map[(ix, iy)] {
                    ox.push(self.calc_x_position(ix));
                    oy.push(self.calc_y_position(iy));
                }
            }
        }
        (ox, oy)
    }
}

impl OccupancyMap for GridMap {
    fn is_free(&self, point: Point2D) -> bool {
        match (self.calc_x_index(point.x), self.calc_y_index(point.y)) {
            (Some(ix), Some(iy)) => !self.obstacle_map[(ix, iy)],
            _ => false,
        }
    }

    fn inside_bounds(&self, point: Point2D) -> bool {
        point.x >= self.min_x && point.x < self.max_x && point.y >= self.min_y && point.y < self.max_y
    }

    fn resolution(&self) -> f64 {
        self.resolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_map_is_free_inside_bounds() {
        let map = GridMap::new(0.0, 0.0, 10.0, 5.0, 0.1, 0.2).unwrap();
        assert_eq!(map.x_width, 100);
        assert_eq!(map.y_width, 50);
        assert!(map.is_free(Point2D::new(5.0, 2.5)));
        assert!(!map.is_free(Point2D::new(10.5, 2.5)));
        assert!(!map.inside_bounds(Point2D::new(-0.1, 1.0)));
    }

    #[test]
    fn test_rectangle_is_inflated_by_robot_radius() {
        let mut map = GridMap::new(0.0, 0.0, 10.0, 10.0, 0.1, 0.3).unwrap();
        map.add_rectangle(4.0, 4.0, 6.0, 6.0);

        assert!(!map.is_free(Point2D::new(5.0, 5.0)));
        assert!(!map.is_free(Point2D::new(3.85, 5.0)));
        assert!(map.is_free(Point2D::new(3.55, 5.0)));
        assert!(map.is_free(Point2D::new(5.0, 6.45)));
    }

    #[test]
    fn test_from_obstacles_uses_point_extent() {
        let mut ox = Vec::new();
        let mut oy = Vec::new();
        for i in 0..11 {
            ox.push(i as f64);
            oy.push(0.0);
            ox.push(i as f64);
            oy.push(10.0);
            ox.push(0.0);
            oy.push(i as f64);
            ox.push(10.0);
            oy.push(i as f64);
        }
        let map = GridMap::from_obstacles(&ox, &oy, 0.5, 0.5).unwrap();

        assert!(map.inside_bounds(Point2D::new(10.2, 10.2)));
        assert!(!map.is_free(Point2D::new(0.2, 5.0)));
        assert!(map.is_free(Point2D::new(5.0, 5.0)));
        let (cx, cy) = map.occupied_cells();
        assert_eq!(cx.len(), cy.len());
        assert!(!cx.is_empty());
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        assert!(GridMap::new(0.0, 0.0, 0.0, 1.0, 0.1, 0.0).is_err());
        assert!(GridMap::new(0.0, 0.0, 1.0, 1.0, 0.0, 0.0).is_err());
        assert!(GridMap::from_obstacles(&[], &[], 1.0, 0.5).is_err());
    }
}
