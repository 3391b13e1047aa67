// ==========================================
// 测试工作簿构建器 - 用于集成测试
// ==========================================

use scrape_import::domain::{CellValue, Row, Sheet};

// ==========================================
// Sheet 构建器
// ==========================================

pub struct SheetBuilder {
    sheet: Sheet,
}

impl SheetBuilder {
    pub fn new(name: &str, columns: &[&str]) -> Self {
        Self {
            sheet: Sheet::new(name, columns.iter().copied()),
        }
    }

    /// 按列顺序追加一行（空字符串表示缺失单元格）
    pub fn row(mut self, values: &[&str]) -> Self {
        let row: Row = self
            .sheet
            .columns
            .iter()
            .zip(values.iter())
            .filter(|(_, v)| !v.is_empty())
            .map(|(c, v)| (c.clone(), CellValue::from(*v)))
            .collect();
        self.sheet.push_row(row);
        self
    }

    pub fn build(self) -> Sheet {
        self.sheet
    }
}

/// 标准商品格式工作表：每个 (id, title, link)
pub fn product_sheet(name: &str, products: &[(&str, &str, &str)]) -> Sheet {
    products
        .iter()
        .fold(
            SheetBuilder::new(name, &["position", "id", "title", "link", "price"]),
            |builder, (id, title, link)| builder.row(&["1", *id, *title, *link, "$10.00"]),
        )
        .build()
}

/// 购物网格工作表：每行一个 (title, link) 列表，按槽位依次填入
pub fn grid_sheet(name: &str, slots: usize, rows: &[Vec<(&str, &str)>]) -> Sheet {
    let mut columns = vec!["Date".to_string(), "Query".to_string()];
    for slot in 1..=slots {
        columns.push(format!("Product{}_Title", slot));
        columns.push(format!("Product{}_Link", slot));
        columns.push(format!("Product{}_Price", slot));
    }

    let mut sheet = Sheet::new(name, columns);
    for products in rows {
        let mut row = Row::new();
        row.insert("Date", "2024-03-01");
        for (idx, (title, link)) in products.iter().enumerate() {
            let slot = idx + 1;
            row.insert(format!("Product{}_Title", slot), *title);
            row.insert(format!("Product{}_Link", slot), *link);
            row.insert(format!("Product{}_Price", slot), "£5.50");
        }
        sheet.push_row(row);
    }
    sheet
}
