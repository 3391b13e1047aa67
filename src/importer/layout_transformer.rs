// ==========================================
// 抓取结果导入系统 - 格式转换器
// ==========================================
// 职责: 工作表 → 标准记录序列（每种格式一个转换器）
// 红线: 纯转换，无 I/O；缺失可选列必须容忍
// 红线: 不合格行静默跳过，只有整表无有效记录才由编排器报错
// ==========================================

use crate::config::ImportConfig;
use crate::domain::{CanonicalRecord, CellValue, Layout, OptionalField, Row, Sheet};
use crate::importer::importer_trait::{ProductIdGenerator, SheetContext, SheetTransformer};
use crate::importer::value_normalizer::{
    clean_price_text, parse_bool, parse_date_or, parse_float, parse_int, parse_price,
};
use chrono::NaiveDateTime;
use std::sync::Arc;
use tracing::{debug, info, warn};

const DATE_COLUMN: &str = "Date";
const QUERY_COLUMN: &str = "Query";

/// 行级日期：Date 列可解析则用之，否则回退默认日期
fn row_date(row: &Row, default_date: NaiveDateTime) -> NaiveDateTime {
    parse_date_or(row.get(DATE_COLUMN), default_date)
}

// ==========================================
// ShoppingGridTransformer - 购物网格格式
// ==========================================
// 每行 = 一次查询 / 日期观测，内嵌最多 N 个商品
// 列: Product<N>_Title / _Link（必需）, _Price / _Merchant（可选）
pub struct ShoppingGridTransformer {
    max_products: usize,
    id_generator: Arc<dyn ProductIdGenerator>,
}

impl ShoppingGridTransformer {
    pub fn new(max_products: usize, id_generator: Arc<dyn ProductIdGenerator>) -> Self {
        Self {
            max_products,
            id_generator,
        }
    }

    fn transform_slot(
        &self,
        row: &Row,
        slot: usize,
        keyword: &str,
        date: NaiveDateTime,
        ctx: &SheetContext,
    ) -> Option<CanonicalRecord> {
        let title = row.verbatim(&format!("Product{}_Title", slot))?;
        let link = row.verbatim(&format!("Product{}_Link", slot))?;

        let mut record = CanonicalRecord::new(
            ctx.campaign_id,
            ctx.scrape_type_id,
            date,
            keyword,
            self.id_generator.next_product_id(),
            title,
            link,
        );
        record.position = Some(slot as i64);

        let price_cell = row.get(&format!("Product{}_Price", slot));
        if !price_cell.is_missing() {
            record.price = parse_price(price_cell);
            record.price_raw = price_cell.as_text().map(|raw| clean_price_text(&raw));
        }
        record.merchant = row.verbatim(&format!("Product{}_Merchant", slot));

        Some(record)
    }
}

impl SheetTransformer for ShoppingGridTransformer {
    fn transform(&self, sheet: &Sheet, ctx: &SheetContext) -> Vec<CanonicalRecord> {
        let mut records = Vec::new();

        for row in &sheet.rows {
            let date = row_date(row, ctx.default_date);
            let keyword = row
                .text(QUERY_COLUMN)
                .unwrap_or_else(|| ctx.keyword.clone());

            records.extend(
                (1..=self.max_products)
                    .filter_map(|slot| self.transform_slot(row, slot, &keyword, date, ctx)),
            );
        }

        info!(
            sheet = %sheet.name,
            rows = sheet.rows.len(),
            records = records.len(),
            "购物网格转换完成"
        );
        records
    }
}

// ==========================================
// ProductStandardTransformer - 标准商品格式
// ==========================================
// 每行 = 一个商品；id / title 必填，link 缺失时合成占位链接
pub struct ProductStandardTransformer {
    config: Arc<ImportConfig>,
}

impl ProductStandardTransformer {
    pub fn new(config: Arc<ImportConfig>) -> Self {
        Self { config }
    }

    fn transform_row(&self, row: &Row, ctx: &SheetContext) -> Option<CanonicalRecord> {
        let product_id = row.verbatim("id")?;
        let title = row.verbatim("title")?;
        let link = row
            .verbatim("link")
            .unwrap_or_else(|| self.config.placeholder_link(&product_id));

        let mut record = CanonicalRecord::new(
            ctx.campaign_id,
            ctx.scrape_type_id,
            row_date(row, ctx.default_date),
            ctx.keyword.clone(),
            product_id,
            title,
            link,
        );

        for field in OptionalField::ALL {
            let Some(column) = self.config.column_for(field) else {
                continue;
            };
            let cell = row.get(column);
            if cell.is_blank() {
                continue;
            }
            apply_optional_field(&mut record, field, cell);
        }

        Some(record)
    }
}

/// 可选字段赋值；无法转换的值单独丢弃，不影响整条记录
fn apply_optional_field(record: &mut CanonicalRecord, field: OptionalField, cell: &CellValue) {
    match field {
        OptionalField::Position => record.position = parse_int(cell),
        OptionalField::Rating => record.rating = parse_float(cell),
        OptionalField::Reviews => record.reviews = parse_int(cell),
        OptionalField::Price => record.price = parse_price(cell),
        OptionalField::PriceRaw => record.price_raw = cell.verbatim_text(),
        OptionalField::Merchant => record.merchant = cell.verbatim_text(),
        OptionalField::IsCarousel => record.is_carousel = parse_bool(cell),
        OptionalField::CarouselPosition => record.carousel_position = parse_int(cell),
        OptionalField::HasProductPage => record.has_product_page = parse_bool(cell),
    }
}

impl SheetTransformer for ProductStandardTransformer {
    fn transform(&self, sheet: &Sheet, ctx: &SheetContext) -> Vec<CanonicalRecord> {
        let records: Vec<CanonicalRecord> = sheet
            .rows
            .iter()
            .filter_map(|row| self.transform_row(row, ctx))
            .collect();

        let skipped = sheet.rows.len() - records.len();
        if skipped > 0 {
            debug!(sheet = %sheet.name, skipped = skipped, "跳过缺少 id/title 的行");
        }
        info!(
            sheet = %sheet.name,
            rows = sheet.rows.len(),
            records = records.len(),
            "商品格式转换完成"
        );
        records
    }
}

// ==========================================
// ProductPositionNoLinkTransformer - 无 link 的商品格式
// ==========================================
// 先按 id 合成 link 列，再委托标准商品转换器
pub struct ProductPositionNoLinkTransformer {
    config: Arc<ImportConfig>,
    inner: ProductStandardTransformer,
}

impl ProductPositionNoLinkTransformer {
    pub fn new(config: Arc<ImportConfig>) -> Self {
        Self {
            inner: ProductStandardTransformer::new(Arc::clone(&config)),
            config,
        }
    }

    fn with_placeholder_links(&self, sheet: &Sheet) -> Sheet {
        let mut linked = sheet.clone();
        if !linked.has_column("link") {
            linked.columns.push("link".to_string());
        }
        for row in &mut linked.rows {
            if let Some(id) = row.verbatim("id") {
                row.insert("link", self.config.placeholder_link(&id));
            }
        }
        linked
    }
}

impl SheetTransformer for ProductPositionNoLinkTransformer {
    fn transform(&self, sheet: &Sheet, ctx: &SheetContext) -> Vec<CanonicalRecord> {
        warn!(sheet = %sheet.name, "工作表缺少 link 列，生成占位链接");
        let linked = self.with_placeholder_links(sheet);
        self.inner.transform(&linked, ctx)
    }
}

// ==========================================
// LayoutTransformers - 格式 → 转换器分派
// ==========================================
pub struct LayoutTransformers {
    shopping_grid: ShoppingGridTransformer,
    product_standard: ProductStandardTransformer,
    product_position_no_link: ProductPositionNoLinkTransformer,
}

impl LayoutTransformers {
    pub fn new(config: Arc<ImportConfig>, id_generator: Arc<dyn ProductIdGenerator>) -> Self {
        Self {
            shopping_grid: ShoppingGridTransformer::new(config.max_grid_products, id_generator),
            product_standard: ProductStandardTransformer::new(Arc::clone(&config)),
            product_position_no_link: ProductPositionNoLinkTransformer::new(config),
        }
    }

    /// 按格式分派；Unrecognized 返回空序列
    pub fn transform(&self, layout: Layout, sheet: &Sheet, ctx: &SheetContext) -> Vec<CanonicalRecord> {
        match layout {
            Layout::ShoppingGrid => self.shopping_grid.transform(sheet, ctx),
            Layout::ProductStandard => self.product_standard.transform(sheet, ctx),
            Layout::ProductPositionNoLink => self.product_position_no_link.transform(sheet, ctx),
            Layout::Unrecognized => {
                warn!(
                    sheet = %sheet.name,
                    columns = ?sheet.columns,
                    "无法识别工作表格式"
                );
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::id_generator::SequentialProductIdGenerator;
    use chrono::NaiveDate;

    fn default_date() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn ctx(keyword: &str) -> SheetContext {
        SheetContext::new(keyword, default_date(), 7, 1)
    }

    fn transformers() -> LayoutTransformers {
        LayoutTransformers::new(
            Arc::new(ImportConfig::default()),
            Arc::new(SequentialProductIdGenerator::new("grid")),
        )
    }

    #[test]
    fn test_grid_one_product_per_row() {
        let sheet = Sheet::new(
            "shoes",
            ["Product1_Title", "Product1_Link", "Product2_Title", "Product2_Link"],
        )
        .with_rows(vec![
            [("Product1_Title", "Red Shoe"), ("Product1_Link", "https://a/1")]
                .into_iter()
                .collect(),
            [("Product2_Title", "Blue Shoe"), ("Product2_Link", "https://a/2")]
                .into_iter()
                .collect(),
        ]);

        let records = transformers().transform(Layout::ShoppingGrid, &sheet, &ctx("shoes"));

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].position, Some(1));
        assert_eq!(records[0].title, "Red Shoe");
        assert_eq!(records[0].product_id, "grid-1");
        assert_eq!(records[1].position, Some(2));
        assert_eq!(records[1].product_id, "grid-2");
        assert!(records.iter().all(|r| r.keyword == "shoes"));
        assert!(records.iter().all(|r| r.scrape_date == default_date()));
        assert!(records.iter().all(|r| r.campaign_id == 7 && r.scrape_type_id == 1));
    }

    #[test]
    fn test_grid_row_query_date_price_merchant() {
        let mut row: Row = [
            ("Query", "running shoes"),
            ("Date", "2024-03-01"),
            ("Product1_Title", "Trail Runner"),
            ("Product1_Link", "https://shop/tr"),
            ("Product1_Price", "$1,299.00"),
            ("Product1_Merchant", "ShoeCo"),
        ]
        .into_iter()
        .collect();
        // 只有标题没有链接的槽位不产出
        row.insert("Product2_Title", "Orphan");
        let sheet = Sheet::new(
            "Sheet1",
            [
                "Query",
                "Date",
                "Product1_Title",
                "Product1_Link",
                "Product1_Price",
                "Product1_Merchant",
                "Product2_Title",
            ],
        )
        .with_rows(vec![row]);

        let records = transformers().transform(Layout::ShoppingGrid, &sheet, &ctx("Sheet1"));

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.keyword, "running shoes");
        assert_eq!(record.scrape_date.date(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(record.price, Some(1299.0));
        assert_eq!(record.price_raw.as_deref(), Some("1299.00"));
        assert_eq!(record.merchant.as_deref(), Some("ShoeCo"));
    }

    #[test]
    fn test_grid_blank_query_uses_sheet_keyword() {
        let sheet = Sheet::new("boots", ["Query", "Product1_Title", "Product1_Link"]).with_rows(
            vec![[("Query", "  "), ("Product1_Title", "T"), ("Product1_Link", "L")]
                .into_iter()
                .collect()],
        );

        let records = transformers().transform(Layout::ShoppingGrid, &sheet, &ctx("boots"));
        assert_eq!(records[0].keyword, "boots");
    }

    #[test]
    fn test_product_standard_fields() {
        let mut row: Row = [
            ("id", "P-100"),
            ("title", "Widget"),
            ("link", "https://shop/widget"),
            ("merchant", "Acme"),
            ("price", "£19.99"),
            ("is_carousel", "yes"),
            ("reviews", "1,204"),
        ]
        .into_iter()
        .collect();
        row.insert("position", 3.0);
        row.insert("rating", 4.5);
        row.insert("has_product_page", 0_i64);
        let sheet = Sheet::new("widgets", ["id", "title", "link"]).with_rows(vec![row]);

        let records = transformers().transform(Layout::ProductStandard, &sheet, &ctx("widgets"));

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.product_id, "P-100");
        assert_eq!(record.link, "https://shop/widget");
        assert_eq!(record.position, Some(3));
        assert_eq!(record.rating, Some(4.5));
        assert_eq!(record.reviews, Some(1204));
        assert_eq!(record.price, Some(19.99));
        assert_eq!(record.merchant.as_deref(), Some("Acme"));
        assert_eq!(record.is_carousel, Some(true));
        assert_eq!(record.has_product_page, Some(false));
        assert_eq!(record.carousel_position, None);
    }

    #[test]
    fn test_product_standard_skips_rows_missing_id_or_title() {
        let sheet = Sheet::new("widgets", ["id", "title", "link"]).with_rows(vec![
            [("id", "P-1"), ("title", "Kept")].into_iter().collect(),
            [("id", ""), ("title", "No id")].into_iter().collect(),
            [("id", "P-3")].into_iter().collect(),
        ]);

        let records = transformers().transform(Layout::ProductStandard, &sheet, &ctx("widgets"));

        assert_eq!(records.len(), 1);
        // link 缺失 → 占位链接
        assert_eq!(records[0].link, "https://example.com/product/P-1");
    }

    #[test]
    fn test_product_standard_bad_position_dropped_not_record() {
        let sheet = Sheet::new("widgets", ["id", "title", "link", "position"]).with_rows(vec![[
            ("id", "P-1"),
            ("title", "Widget"),
            ("link", "L"),
            ("position", "top"),
        ]
        .into_iter()
        .collect()]);

        let records = transformers().transform(Layout::ProductStandard, &sheet, &ctx("widgets"));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].position, None);
    }

    #[test]
    fn test_numeric_id_rendered_without_fraction() {
        let mut row = Row::new();
        row.insert("id", 12345.0);
        row.insert("title", "Numeric");
        row.insert("link", "L");
        let sheet = Sheet::new("widgets", ["id", "title", "link"]).with_rows(vec![row]);

        let records = transformers().transform(Layout::ProductStandard, &sheet, &ctx("widgets"));
        assert_eq!(records[0].product_id, "12345");
    }

    #[test]
    fn test_position_no_link_synthesizes_links() {
        let sheet = Sheet::new("gadgets", ["position", "title", "id"]).with_rows(vec![
            [("position", "1"), ("title", "A"), ("id", "G-1")]
                .into_iter()
                .collect(),
            [("position", "2"), ("title", "B"), ("id", "G-2")]
                .into_iter()
                .collect(),
        ]);

        let records =
            transformers().transform(Layout::ProductPositionNoLink, &sheet, &ctx("gadgets"));

        assert_eq!(records.len(), 2);
        for record in &records {
            assert!(!record.link.is_empty());
            assert!(record.link.contains(&record.product_id));
        }
        assert_eq!(records[1].position, Some(2));
    }

    #[test]
    fn test_product_standard_keeps_padded_text_verbatim() {
        let sheet = Sheet::new("widgets", ["id", "title", "link", "merchant", "price_raw"])
            .with_rows(vec![[
                ("id", " P-1 "),
                ("title", " Widget "),
                ("link", "https://x/1 "),
                ("merchant", " Acme "),
                ("price_raw", " $5 "),
                ("position", " 2 "),
            ]
            .into_iter()
            .collect()]);

        let records = transformers().transform(Layout::ProductStandard, &sheet, &ctx("widgets"));

        let record = &records[0];
        assert_eq!(record.product_id, " P-1 ");
        assert_eq!(record.title, " Widget ");
        assert_eq!(record.link, "https://x/1 ");
        assert_eq!(record.merchant.as_deref(), Some(" Acme "));
        assert_eq!(record.price_raw.as_deref(), Some(" $5 "));
        // 数值字段仍按 TRIM 后解析
        assert_eq!(record.position, Some(2));
    }

    #[test]
    fn test_grid_keeps_padded_title_and_link() {
        let sheet = Sheet::new("shoes", ["Product1_Title", "Product1_Link", "Product1_Merchant"])
            .with_rows(vec![[
                ("Product1_Title", " Red Shoe "),
                ("Product1_Link", " https://a/1"),
                ("Product1_Merchant", "ShoeCo "),
            ]
            .into_iter()
            .collect()]);

        let records = transformers().transform(Layout::ShoppingGrid, &sheet, &ctx("shoes"));

        assert_eq!(records[0].title, " Red Shoe ");
        assert_eq!(records[0].link, " https://a/1");
        assert_eq!(records[0].merchant.as_deref(), Some("ShoeCo "));
    }

    #[test]
    fn test_grid_reads_slot_15_and_ignores_slot_16() {
        let columns = [
            "Product1_Title",
            "Product1_Link",
            "Product15_Title",
            "Product15_Link",
            "Product16_Title",
            "Product16_Link",
        ];
        let row: Row = columns
            .iter()
            .map(|column| (*column, format!("{} value", column)))
            .collect();
        let sheet = Sheet::new("shoes", columns).with_rows(vec![row]);

        let records = transformers().transform(Layout::ShoppingGrid, &sheet, &ctx("shoes"));

        let positions: Vec<Option<i64>> = records.iter().map(|r| r.position).collect();
        assert_eq!(positions, vec![Some(1), Some(15)]);
        assert_eq!(records[1].title, "Product15_Title value");
    }

    #[test]
    fn test_unrecognized_yields_nothing() {
        let sheet = Sheet::new("misc", ["foo", "bar"])
            .with_rows(vec![[("foo", "1"), ("bar", "2")].into_iter().collect()]);
        let records = transformers().transform(Layout::Unrecognized, &sheet, &ctx("misc"));
        assert!(records.is_empty());
    }

    #[test]
    fn test_custom_optional_field_mapping() {
        let config = ImportConfig::from_json_str(r#"{ "optional_fields": { "rating": "stars" } }"#)
            .unwrap();
        let transformers = LayoutTransformers::new(
            Arc::new(config),
            Arc::new(SequentialProductIdGenerator::new("grid")),
        );
        let sheet = Sheet::new("widgets", ["id", "title", "link"]).with_rows(vec![[
            ("id", "P-1"),
            ("title", "Widget"),
            ("link", "L"),
            ("stars", "4.8"),
            ("position", "9"),
        ]
        .into_iter()
        .collect()]);

        let records = transformers.transform(Layout::ProductStandard, &sheet, &ctx("widgets"));
        assert_eq!(records[0].rating, Some(4.8));
        // position 未映射，不读取
        assert_eq!(records[0].position, None);
    }
}
