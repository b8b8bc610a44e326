//! 直线提取
//!
//! 边缘图 → Hough 变换得到极坐标直线 → 沿直线扫描边缘像素切分出线段
//! → 合并近似共线的线段。
//!
//! 合并是贪心的，结果依赖输入顺序；合并前按 (方向角, 起点, 终点) 排序，
//! 使同一输入总得到同一输出。

use image::GrayImage;
use imageproc::hough::{detect_lines, LineDetectionOptions, PolarLine};
use planmod_core::geometry::Line;
use planmod_core::math::{Point2, Vector2, EPSILON};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineOptions {
    /// Canny 低阈值
    pub canny_low: f32,
    /// Canny 高阈值
    pub canny_high: f32,
    /// Hough 最小投票数
    pub hough_threshold: u32,
    /// Hough 非极大值抑制半径
    pub hough_suppression_radius: u32,
    /// 短于该长度的线段丢弃（像素）
    pub min_line_length: f64,
    /// 同一直线上允许的最大断开距离（像素）
    pub max_line_gap: f64,
    /// 合并时允许的方向差（度）
    pub angle_tolerance_deg: f64,
    /// 合并时允许的端点距离（像素）
    pub distance_tolerance: f64,
}

impl Default for LineOptions {
    fn default() -> Self {
        Self {
            canny_low: 50.0,
            canny_high: 150.0,
            hough_threshold: 50,
            hough_suppression_radius: 8,
            min_line_length: 20.0,
            max_line_gap: 10.0,
            angle_tolerance_deg: 2.0,
            distance_tolerance: 10.0,
        }
    }
}

/// 提取出的线段。方向角归一化到 (-90, 90]，起点在方向的负端。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedLine {
    pub start: Point2,
    pub end: Point2,
    pub length: f64,
    /// 方向角（度）
    pub angle: f64,
}

impl ExtractedLine {
    pub fn new(start: Point2, end: Point2) -> Self {
        let mut angle = (end.y - start.y).atan2(end.x - start.x).to_degrees();
        let (start, end) = if angle > 90.0 || angle <= -90.0 {
            angle = if angle > 90.0 { angle - 180.0 } else { angle + 180.0 };
            (end, start)
        } else {
            (start, end)
        };
        Self {
            start,
            end,
            length: (end - start).norm(),
            angle,
        }
    }

    pub fn as_line(&self) -> Line {
        Line::new(self.start, self.end)
    }

    fn direction(&self) -> Vector2 {
        let rad = self.angle.to_radians();
        Vector2::new(rad.cos(), rad.sin())
    }

    /// 稳定排序键
    fn sort_cmp(&self, other: &Self) -> Ordering {
        self.angle
            .total_cmp(&other.angle)
            .then(self.start.x.total_cmp(&other.start.x))
            .then(self.start.y.total_cmp(&other.start.y))
            .then(self.end.x.total_cmp(&other.end.x))
            .then(self.end.y.total_cmp(&other.end.y))
    }
}

/// 两个方向角（模 180°）之差
fn orientation_difference(a: f64, b: f64) -> f64 {
    let d = (a - b).abs() % 180.0;
    d.min(180.0 - d)
}

#[derive(Debug, Clone, Default)]
pub struct LineExtractor {
    options: LineOptions,
}

impl LineExtractor {
    pub fn new(options: LineOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LineOptions {
        &self.options
    }

    /// 对灰度图做边缘检测后提取
    pub fn extract(&self, gray: &GrayImage) -> Vec<ExtractedLine> {
        let edges = crate::raster::edge_map(gray, self.options.canny_low, self.options.canny_high);
        self.extract_from_edges(&edges)
    }

    /// 从边缘图（非零像素为边缘）提取
    pub fn extract_from_edges(&self, edges: &GrayImage) -> Vec<ExtractedLine> {
        let polar = detect_lines(
            edges,
            LineDetectionOptions {
                vote_threshold: self.options.hough_threshold,
                suppression_radius: self.options.hough_suppression_radius,
            },
        );

        let candidates: Vec<ExtractedLine> = polar
            .iter()
            .flat_map(|line| self.segments_along(edges, line))
            .collect();

        debug!(
            "Hough found {} lines, {} candidate segments",
            polar.len(),
            candidates.len()
        );

        self.merge(candidates)
    }

    /// 沿极坐标直线扫描边缘像素，按 max_line_gap 切分成线段
    fn segments_along(&self, edges: &GrayImage, line: &PolarLine) -> Vec<ExtractedLine> {
        let (w, h) = (edges.width() as f64, edges.height() as f64);
        let theta = (line.angle_in_degrees as f64).to_radians();
        let normal = Vector2::new(theta.cos(), theta.sin());
        let dir = Vector2::new(-theta.sin(), theta.cos());
        let origin = Point2::origin() + normal * line.r as f64;

        let is_edge = |p: Point2| -> bool {
            // 允许垂直于直线方向 ±1 像素的偏差
            [-1.0, 0.0, 1.0].iter().any(|k| {
                let q = p + normal * *k;
                let (x, y) = (q.x.round(), q.y.round());
                x >= 0.0 && y >= 0.0 && x < w && y < h && edges.get_pixel(x as u32, y as u32)[0] > 0
            })
        };

        let extent = (w * w + h * h).sqrt();
        let steps = (2.0 * extent).ceil() as i64;

        let mut segments = Vec::new();
        let mut run: Option<(f64, f64)> = None;
        let mut last_hit = f64::MIN;

        for i in 0..=steps {
            let t = -extent + i as f64;
            let p = origin + dir * t;
            if !is_edge(p) {
                continue;
            }
            run = match run {
                Some((start, _)) if t - last_hit <= self.options.max_line_gap + 1.0 => Some((start, t)),
                Some(done) => {
                    self.push_segment(&mut segments, origin, dir, done);
                    Some((t, t))
                }
                None => Some((t, t)),
            };
            last_hit = t;
        }
        if let Some(done) = run {
            self.push_segment(&mut segments, origin, dir, done);
        }
        segments
    }

    fn push_segment(
        &self,
        out: &mut Vec<ExtractedLine>,
        origin: Point2,
        dir: Vector2,
        (t0, t1): (f64, f64),
    ) {
        let seg = ExtractedLine::new(origin + dir * t0, origin + dir * t1);
        if seg.length >= self.options.min_line_length.max(EPSILON) {
            out.push(seg);
        }
    }

    /// 贪心合并近似共线线段
    pub fn merge(&self, mut lines: Vec<ExtractedLine>) -> Vec<ExtractedLine> {
        lines.retain(|l| l.length >= self.options.min_line_length.max(EPSILON));
        lines.sort_by(|a, b| a.sort_cmp(b));

        let mut used = vec![false; lines.len()];
        let mut merged = Vec::with_capacity(lines.len());

        for i in 0..lines.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            let mut current = lines[i].clone();

            for j in (i + 1)..lines.len() {
                if used[j] || !self.can_merge(&current, &lines[j]) {
                    continue;
                }
                current = Self::merge_pair(&current, &lines[j]);
                used[j] = true;
            }
            merged.push(current);
        }

        debug!("Merged {} segments into {}", lines.len(), merged.len());
        merged
    }

    fn can_merge(&self, a: &ExtractedLine, b: &ExtractedLine) -> bool {
        if orientation_difference(a.angle, b.angle) > self.options.angle_tolerance_deg {
            return false;
        }
        let seg = a.as_line();
        let dist = seg
            .distance_to_point(&b.start)
            .min(seg.distance_to_point(&b.end));
        dist <= self.options.distance_tolerance
    }

    /// 把四个端点投影到 a 的方向上，取两端极值
    fn merge_pair(a: &ExtractedLine, b: &ExtractedLine) -> ExtractedLine {
        let dir = a.direction();
        let base = a.start;
        let (t_min, t_max) = [a.start, a.end, b.start, b.end]
            .iter()
            .map(|p| (p - base).dot(&dir))
            .fold((f64::MAX, f64::MIN), |(lo, hi), t| (lo.min(t), hi.max(t)));
        ExtractedLine::new(base + dir * t_min, base + dir * t_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn extractor() -> LineExtractor {
        LineExtractor::new(LineOptions {
            min_line_length: 5.0,
            ..Default::default()
        })
    }

    #[test]
    fn test_collinear_segments_merge() {
        let merged = extractor().merge(vec![
            ExtractedLine::new(Point2::new(10.5, 0.0), Point2::new(20.0, 0.0)),
            ExtractedLine::new(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0)),
        ]);

        assert_eq!(merged.len(), 1);
        let line = &merged[0];
        assert!((line.start - Point2::new(0.0, 0.0)).norm() < 1e-9);
        assert!((line.end - Point2::new(20.0, 0.0)).norm() < 1e-9);
        assert!((line.length - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_non_parallel_segments_stay_apart() {
        let merged = extractor().merge(vec![
            ExtractedLine::new(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0)),
            ExtractedLine::new(Point2::new(0.0, 0.0), Point2::new(0.0, 10.0)),
            // 平行但相距 30
            ExtractedLine::new(Point2::new(0.0, 30.0), Point2::new(10.0, 30.0)),
        ]);
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn test_orientation_normalization() {
        let l = ExtractedLine::new(Point2::new(10.0, 0.0), Point2::new(0.0, 0.0));
        assert_eq!(l.start, Point2::new(0.0, 0.0));
        assert!(l.angle.abs() < 1e-12);

        let v = ExtractedLine::new(Point2::new(0.0, 10.0), Point2::new(0.0, 0.0));
        assert!((v.angle - 90.0).abs() < 1e-12);

        assert!(orientation_difference(89.5, -89.5) < 1.01);
    }

    #[test]
    fn test_merge_is_order_independent_after_sort() {
        let segs = vec![
            ExtractedLine::new(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0)),
            ExtractedLine::new(Point2::new(12.0, 0.5), Point2::new(25.0, 0.5)),
            ExtractedLine::new(Point2::new(0.0, 50.0), Point2::new(0.0, 90.0)),
        ];
        let mut reversed = segs.clone();
        reversed.reverse();

        assert_eq!(extractor().merge(segs), extractor().merge(reversed));
    }

    #[test]
    fn test_extract_from_edges_finds_horizontal_line() {
        let mut edges = GrayImage::new(120, 60);
        for x in 10..110 {
            edges.put_pixel(x, 30, Luma([255]));
        }

        let lines = LineExtractor::default().extract_from_edges(&edges);
        assert_eq!(lines.len(), 1);
        let l = &lines[0];
        assert!(l.angle.abs() < 1.0);
        assert!((l.start.y - 30.0).abs() < 1.5);
        assert!(l.length > 90.0 && l.length < 105.0);
    }
}
