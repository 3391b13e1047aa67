// ==========================================
// 抓取结果导入系统 - 导入层
// ==========================================
// 职责: 工作簿 → 标准记录 → 去重落库
// 支持: Excel, CSV, 内存工作簿
// ==========================================

// 模块声明
pub mod duplicate_loader;
pub mod error;
pub mod id_generator;
pub mod importer_trait;
pub mod layout_detector;
pub mod layout_transformer;
pub mod sheet_source;
pub mod value_normalizer;
pub mod workbook_importer;

// 重导出核心类型
pub use duplicate_loader::{DuplicateAwareLoader, DuplicateIndex, LoadOutcome};
pub use error::{ImportError, ImportResult};
pub use id_generator::{SequentialProductIdGenerator, UuidProductIdGenerator};
pub use layout_detector::{detect_layout, detect_layout_from_columns};
pub use layout_transformer::{
    LayoutTransformers, ProductPositionNoLinkTransformer, ProductStandardTransformer,
    ShoppingGridTransformer,
};
pub use sheet_source::{open_workbook_source, CsvWorkbookSource, ExcelWorkbookSource};
pub use workbook_importer::WorkbookImporterImpl;

// 重导出 Trait 接口
pub use importer_trait::{
    ProductIdGenerator, SheetContext, SheetSource, SheetTransformer, WorkbookImporter,
};
