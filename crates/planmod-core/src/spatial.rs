//! 空间索引
//!
//! 基于网格的包围盒索引，条目以插入序号标识，支持：
//! - 范围查询
//! - 点击测试
//! - 最近邻查询（按中心距离，距离相同时取序号小者）

use crate::math::{BoundingBox2, Point2};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug)]
pub struct SpatialIndex {
    /// 网格单元大小
    cell_size: f64,

    /// 网格坐标 -> 条目序号
    grid: HashMap<(i64, i64), Vec<usize>>,

    /// 条目的包围盒
    bboxes: HashMap<usize, BoundingBox2>,
}

impl SpatialIndex {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size: if cell_size > 0.0 { cell_size } else { 100.0 },
            grid: HashMap::new(),
            bboxes: HashMap::new(),
        }
    }

    /// 由包围盒序列建立索引，序号即位置
    pub fn from_boxes<'a>(cell_size: f64, boxes: impl IntoIterator<Item = &'a BoundingBox2>) -> Self {
        let mut index = Self::new(cell_size);
        for (i, bbox) in boxes.into_iter().enumerate() {
            index.insert(i, *bbox);
        }
        index
    }

    fn to_grid_coord(&self, x: f64, y: f64) -> (i64, i64) {
        (
            (x / self.cell_size).floor() as i64,
            (y / self.cell_size).floor() as i64,
        )
    }

    fn cells_for_bbox(&self, bbox: &BoundingBox2) -> Vec<(i64, i64)> {
        let (min_gx, min_gy) = self.to_grid_coord(bbox.min.x, bbox.min.y);
        let (max_gx, max_gy) = self.to_grid_coord(bbox.max.x, bbox.max.y);

        let mut cells = Vec::new();
        for gx in min_gx..=max_gx {
            for gy in min_gy..=max_gy {
                cells.push((gx, gy));
            }
        }
        cells
    }

    pub fn insert(&mut self, id: usize, bbox: BoundingBox2) {
        self.remove(id);
        // 非有限坐标无法落入网格
        if !bbox.is_finite() || bbox.is_empty() {
            return;
        }
        for cell in self.cells_for_bbox(&bbox) {
            self.grid.entry(cell).or_default().push(id);
        }
        self.bboxes.insert(id, bbox);
    }

    pub fn remove(&mut self, id: usize) -> bool {
        let Some(bbox) = self.bboxes.remove(&id) else {
            return false;
        };
        for cell in self.cells_for_bbox(&bbox) {
            if let Some(ids) = self.grid.get_mut(&cell) {
                ids.retain(|e| *e != id);
            }
        }
        true
    }

    /// 与矩形相交的条目，按序号升序
    pub fn query_rect(&self, rect: &BoundingBox2) -> Vec<usize> {
        let mut seen = BTreeSet::new();
        for cell in self.cells_for_bbox(rect) {
            if let Some(ids) = self.grid.get(&cell) {
                for id in ids {
                    if self.bboxes.get(id).is_some_and(|b| b.intersects(rect)) {
                        seen.insert(*id);
                    }
                }
            }
        }
        seen.into_iter().collect()
    }

    /// 包含该点的条目，按序号升序
    pub fn query_point(&self, point: &Point2) -> Vec<usize> {
        let cell = self.to_grid_coord(point.x, point.y);
        let mut result: Vec<usize> = self
            .grid
            .get(&cell)
            .map(|ids| {
                ids.iter()
                    .copied()
                    .filter(|id| self.bboxes.get(id).is_some_and(|b| b.contains(point)))
                    .collect()
            })
            .unwrap_or_default();
        result.sort_unstable();
        result
    }

    /// 中心距离严格小于 max_distance 的最近条目
    pub fn query_nearest(&self, point: &Point2, max_distance: f64) -> Option<(usize, f64)> {
        if !(point.x.is_finite() && point.y.is_finite()) {
            return None;
        }
        let search = BoundingBox2::new(
            Point2::new(point.x - max_distance, point.y - max_distance),
            Point2::new(point.x + max_distance, point.y + max_distance),
        );

        self.query_rect(&search)
            .into_iter()
            .filter_map(|id| {
                let dist = (self.bboxes.get(&id)?.center() - point).norm();
                (dist < max_distance).then_some((id, dist))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
    }

    pub fn len(&self) -> usize {
        self.bboxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bboxes.is_empty()
    }

    pub fn clear(&mut self) {
        self.grid.clear();
        self.bboxes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spatial_index() {
        let boxes = [
            BoundingBox2::new(Point2::new(0.0, 0.0), Point2::new(5.0, 5.0)),
            BoundingBox2::new(Point2::new(10.0, 10.0), Point2::new(15.0, 15.0)),
            BoundingBox2::new(Point2::new(100.0, 100.0), Point2::new(105.0, 105.0)),
        ];
        let index = SpatialIndex::from_boxes(10.0, &boxes);

        let result = index.query_rect(&BoundingBox2::new(Point2::new(0.0, 0.0), Point2::new(20.0, 20.0)));
        assert_eq!(result, vec![0, 1]);
        assert_eq!(index.query_point(&Point2::new(102.0, 101.0)), vec![2]);
    }

    #[test]
    fn test_nearest_is_strict_and_tie_breaks_by_index() {
        let boxes = [
            BoundingBox2::from_xywh(-12.0, -2.0, 4.0, 4.0), // 中心 (-10, 0)
            BoundingBox2::from_xywh(8.0, -2.0, 4.0, 4.0),   // 中心 (10, 0)
        ];
        let index = SpatialIndex::from_boxes(5.0, &boxes);

        let (id, dist) = index.query_nearest(&Point2::origin(), 100.0).unwrap();
        assert_eq!(id, 0);
        assert!((dist - 10.0).abs() < 1e-12);

        // 距离恰好等于半径时不命中
        assert!(index.query_nearest(&Point2::origin(), 10.0).is_none());
    }
}
