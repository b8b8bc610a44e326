//! PlanMod 核心
//!
//! 模型飞机图纸数字化的数据模型与算法：
//! - `scene`: 场景图（视图、部件、几何实体、标注、关系）
//! - `relationships`: 包含/相邻/标注关系推导
//! - `classification`: 外部分类结果导入
//! - `catalog` / `material`: 标准件目录与材料密度表
//! - `mass`: 质量与重心估算
//!
//! # 坐标约定
//!
//! 场景图使用图像坐标：原点在左上角，y 轴向下。
//! 输出 CAD 文件时才转换为图纸坐标。
//!
//! # 示例
//!
//! ```rust
//! use planmod_core::prelude::*;
//!
//! let mut graph = SceneGraph::new("Trainer");
//! let view = graph.add_view(View::new(
//!     "Wing",
//!     ViewType::Top,
//!     BoundingBox2::from_xywh(0.0, 0.0, 800.0, 300.0),
//! ));
//! graph.add_component(
//!     Component::new("W1", ComponentType::Rib, BoundingBox2::from_xywh(10.0, 10.0, 5.0, 120.0))
//!         .with_view(&view),
//! );
//!
//! RelationshipBuilder::default().build(&mut graph);
//! assert_eq!(graph.relationships.len(), 1);
//! ```

pub mod catalog;
pub mod classification;
pub mod error;
pub mod geometry;
pub mod mass;
pub mod material;
pub mod math;
pub mod relationships;
pub mod scene;
pub mod spatial;
pub mod transform;

pub mod prelude {
    //! 常用类型的便捷导入
    pub use crate::catalog::{Catalog, CatalogEntry, CatalogMass, CatalogQuery, CrossSection};
    pub use crate::classification::{ingest, ClassificationInput};
    pub use crate::error::{CoreError, CoreResult, GeometryError};
    pub use crate::geometry::{Arc, Circle, EntityKind, Line, Polyline, Shape};
    pub use crate::mass::{MassPropertiesCalculator, MassReport, MassSource};
    pub use crate::material::MaterialTable;
    pub use crate::math::{BoundingBox2, Point2, Vector2};
    pub use crate::relationships::{RelationshipBuilder, RelationshipOptions};
    pub use crate::scene::{
        Annotation, AnnotationType, Component, ComponentAttributes, ComponentType, Dimension,
        GeometryEntity, MaterialType, Relationship, RelationshipType, SceneGraph, View, ViewType,
    };
    pub use crate::spatial::SpatialIndex;
    pub use crate::transform::Transform2D;
}
