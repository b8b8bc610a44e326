//! 矢量化引擎
//!
//! 直线提取与轮廓追踪互不依赖，并行运行在同一张只读灰度图上；
//! 圆弧拟合在轮廓结果上逐个并行。所有结果收集完毕后由调用方
//! 持有的 `&mut SceneGraph` 统一写入。

use crate::arcs::{ArcFitter, ArcOptions, FittedCurve};
use crate::contours::{ContourOptions, ContourTracer, TracedContour};
use crate::error::VisionResult;
use crate::lines::{ExtractedLine, LineExtractor, LineOptions};
use image::GrayImage;
use planmod_core::geometry::EntityKind;
use planmod_core::scene::{GeometryEntity, SceneGraph};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizationOptions {
    pub lines: LineOptions,
    pub contours: ContourOptions,
    pub arcs: ArcOptions,
}

/// 三个提取器的原始输出
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub lines: Vec<ExtractedLine>,
    pub contours: Vec<TracedContour>,
    /// 与 `contours` 等长；未拟合成功的位置为 None
    pub curves: Vec<Option<FittedCurve>>,
}

impl Extraction {
    pub fn fitted_count(&self) -> usize {
        self.curves.iter().filter(|c| c.is_some()).count()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorizationStats {
    pub lines: usize,
    pub contours: usize,
    pub arcs: usize,
    pub polylines: usize,
    /// 写入场景图的实体总数
    pub entities: usize,
    /// 关联到视图的实体数
    pub associated: usize,
}

#[derive(Debug, Clone)]
pub struct VectorizationEngine {
    lines: LineExtractor,
    contours: ContourTracer,
    arcs: ArcFitter,
    min_polyline_vertices: usize,
}

impl VectorizationEngine {
    pub fn new(options: VectorizationOptions) -> Self {
        Self {
            min_polyline_vertices: options.contours.min_polyline_vertices,
            lines: LineExtractor::new(options.lines),
            contours: ContourTracer::new(options.contours),
            arcs: ArcFitter::new(options.arcs),
        }
    }

    /// 运行三个提取器
    pub fn extract(&self, gray: &GrayImage) -> Extraction {
        let (lines, contours) = rayon::join(
            || self.lines.extract(gray),
            || self.contours.trace(gray),
        );
        let curves: Vec<Option<FittedCurve>> = contours
            .par_iter()
            .map(|c| self.arcs.fit_contour(c))
            .collect();

        Extraction {
            lines,
            contours,
            curves,
        }
    }

    /// 把提取结果转成几何实体（尚未关联视图）
    ///
    /// 顺序：直线，然后按轮廓顺序输出圆/圆弧或多段线。
    /// 拟合为圆或圆弧的轮廓不再重复输出为多段线。
    pub fn to_entities(&self, extraction: &Extraction) -> Vec<GeometryEntity> {
        let mut entities: Vec<GeometryEntity> = extraction
            .lines
            .iter()
            .map(|l| GeometryEntity::line(l.start, l.end))
            .collect();

        for (contour, curve) in extraction.contours.iter().zip(&extraction.curves) {
            match curve {
                Some(fitted) => entities.push(GeometryEntity::new(fitted.to_shape())),
                None if contour.is_closed && contour.points.len() >= self.min_polyline_vertices => {
                    entities.push(GeometryEntity::polyline(contour.points.clone(), true));
                }
                None => {}
            }
        }
        entities
    }

    /// 矢量化并写入场景图
    pub fn vectorize(&self, gray: &GrayImage, graph: &mut SceneGraph) -> VectorizationStats {
        info!("Vectorizing {}x{} raster", gray.width(), gray.height());
        if graph.image_width == 0 || graph.image_height == 0 {
            graph.image_width = gray.width();
            graph.image_height = gray.height();
        }

        let extraction = self.extract(gray);
        let mut stats = VectorizationStats {
            lines: extraction.lines.len(),
            contours: extraction.contours.len(),
            arcs: extraction.fitted_count(),
            ..Default::default()
        };

        for entity in self.to_entities(&extraction) {
            let entity = associate(graph, entity);
            if entity.view_id().is_some() {
                stats.associated += 1;
            }
            if entity.kind() == EntityKind::Polyline {
                stats.polylines += 1;
            }
            graph.add_entity(entity);
            stats.entities += 1;
        }

        graph.add_processing_note(format!(
            "Vectorization: {} lines, {} contours, {} arcs",
            stats.lines, stats.contours, stats.arcs
        ));
        info!(
            "Vectorization produced {} entities ({} associated with views)",
            stats.entities, stats.associated
        );
        stats
    }

    pub fn vectorize_file(
        &self,
        path: &Path,
        graph: &mut SceneGraph,
    ) -> VisionResult<VectorizationStats> {
        let gray = crate::raster::load_gray(path)?;
        if graph.source_file.is_none() {
            graph.source_file = Some(path.display().to_string());
        }
        Ok(self.vectorize(&gray, graph))
    }
}

impl Default for VectorizationEngine {
    fn default() -> Self {
        Self::new(VectorizationOptions::default())
    }
}

/// 按参考点关联视图，再在视图内找最小的包含部件
fn associate(graph: &SceneGraph, entity: GeometryEntity) -> GeometryEntity {
    let Some(point) = entity.shape().reference_point() else {
        return entity;
    };
    let Some(view) = graph.view_at(&point) else {
        return entity;
    };
    let component = graph.component_at(&view.id, &point).map(|c| c.id.clone());
    let entity = entity.with_view(view.id.clone());
    match component {
        Some(id) => {
            debug!("Entity {} -> component {}", entity.id(), id);
            entity.with_component(id)
        }
        None => entity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
    use imageproc::rect::Rect;
    use planmod_core::math::BoundingBox2;
    use planmod_core::scene::{Component, ComponentType, View, ViewType};

    fn drawing() -> GrayImage {
        let mut img = GrayImage::from_pixel(200, 120, Luma([255]));
        draw_filled_rect_mut(&mut img, Rect::at(20, 20).of_size(60, 30), Luma([0]));
        img
    }

    #[test]
    fn test_rectangle_becomes_associated_entities() {
        let mut graph = SceneGraph::new("t");
        let view = graph.add_view(View::new(
            "Side",
            ViewType::Side,
            BoundingBox2::from_xywh(0.0, 0.0, 100.0, 120.0),
        ));
        let fuselage = graph.add_component(
            Component::new(
                "F",
                ComponentType::Longeron,
                BoundingBox2::from_xywh(10.0, 10.0, 80.0, 50.0),
            )
            .with_view(&view),
        );

        let stats = VectorizationEngine::default().vectorize(&drawing(), &mut graph);

        assert_eq!((graph.image_width, graph.image_height), (200, 120));
        assert!(stats.lines >= 2);
        assert_eq!(stats.contours, 1);
        assert_eq!(stats.arcs, 0);
        assert_eq!(stats.entities, graph.entities.len());
        assert!(graph.entities.iter().all(|e| {
            e.view_id() == Some(view.as_str()) && e.component_id() == Some(fuselage.as_str())
        }));
        assert_eq!(graph.processing_notes.len(), 1);
        assert!(graph.processing_notes[0].starts_with("Vectorization: "));
    }

    #[test]
    fn test_circle_is_not_duplicated_as_polyline() {
        let mut img = GrayImage::from_pixel(120, 120, Luma([255]));
        draw_filled_circle_mut(&mut img, (60, 60), 30, Luma([0]));

        let engine = VectorizationEngine::default();
        let extraction = engine.extract(&img);
        assert_eq!(extraction.contours.len(), 1);
        assert_eq!(extraction.fitted_count(), 1);

        let curves: Vec<GeometryEntity> = engine
            .to_entities(&extraction)
            .into_iter()
            .filter(|e| e.kind() != EntityKind::Line)
            .collect();
        assert_eq!(curves.len(), 1);
        assert_eq!(curves[0].kind(), EntityKind::Circle);
    }
}
