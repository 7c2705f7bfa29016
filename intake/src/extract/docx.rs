use crate::error::{IntakeError, Result};

use super::ExtractedText;

pub fn extract(bytes: &[u8]) -> Result<ExtractedText> {
    let docx = docx_rs::read_docx(bytes)
        .map_err(|e| IntakeError::Processing(format!("DOCX parse error: {e}")))?;

    let mut text = String::new();

    for child in &docx.document.children {
        match child {
            docx_rs::DocumentChild::Paragraph(paragraph) => {
                let para_text = extract_paragraph(paragraph);
                if !para_text.trim().is_empty() {
                    if !text.is_empty() {
                        text.push('\n');
                    }
                    text.push_str(&para_text);
                }
            }
            docx_rs::DocumentChild::Table(table) => {
                let table_text = extract_table(table);
                if !table_text.is_empty() {
                    if !text.is_empty() {
                        text.push('\n');
                    }
                    text.push_str(&table_text);
                }
            }
            _ => {}
        }
    }

    Ok(ExtractedText::from_text(text))
}

fn extract_paragraph(paragraph: &docx_rs::Paragraph) -> String {
    let heading_prefix = paragraph
        .property
        .style
        .as_ref()
        .map(|style| {
            if let Some(level_str) = style.val.strip_prefix("Heading") {
                if let Ok(level) = level_str.parse::<u8>() {
                    if (1..=6).contains(&level) {
                        return "#".repeat(level as usize) + " ";
                    }
                }
                String::new()
            } else if style.val == "Title" {
                "# ".to_string()
            } else {
                String::new()
            }
        })
        .unwrap_or_default();

    let list_prefix = if heading_prefix.is_empty() {
        get_list_prefix(paragraph)
    } else {
        String::new()
    };

    let content = paragraph_text(paragraph);

    if content.is_empty() {
        String::new()
    } else if !heading_prefix.is_empty() {
        heading_prefix + &content
    } else {
        list_prefix + &content
    }
}

fn paragraph_text(paragraph: &docx_rs::Paragraph) -> String {
    let mut content = String::new();
    for para_child in &paragraph.children {
        if let docx_rs::ParagraphChild::Run(run) = para_child {
            for run_child in &run.children {
                if let docx_rs::RunChild::Text(text) = run_child {
                    content.push_str(&text.text);
                }
            }
        }
    }
    content
}

fn get_list_prefix(paragraph: &docx_rs::Paragraph) -> String {
    let Some(numbering) = &paragraph.property.numbering_property else {
        return String::new();
    };
    let Some(ilvl) = &numbering.level else {
        return String::new();
    };

    let indent = "  ".repeat(ilvl.val);
    match &numbering.id {
        Some(num_id) if num_id.id % 2 == 0 => format!("{indent}- "),
        Some(_) => format!("{indent}1. "),
        None => format!("{indent}- "),
    }
}

fn extract_table(table: &docx_rs::Table) -> String {
    let mut rows: Vec<Vec<String>> = Vec::new();

    for table_child in &table.rows {
        let docx_rs::TableChild::TableRow(row) = table_child;
        let mut row_cells: Vec<String> = Vec::new();
        for row_child in &row.cells {
            let docx_rs::TableRowChild::TableCell(cell) = row_child;
            let mut cell_text = String::new();
            for cell_child in &cell.children {
                if let docx_rs::TableCellContent::Paragraph(para) = cell_child {
                    let para_text = paragraph_text(para);
                    if !cell_text.is_empty() {
                        cell_text.push(' ');
                    }
                    cell_text.push_str(&para_text);
                }
            }
            row_cells.push(cell_text.trim().to_string());
        }
        if !row_cells.is_empty() {
            rows.push(row_cells);
        }
    }

    if rows.is_empty() {
        return String::new();
    }

    let col_count = rows[0].len();
    let mut result = String::new();

    result.push_str("| ");
    for (i, cell) in rows[0].iter().enumerate() {
        result.push_str(cell);
        if i < col_count - 1 {
            result.push_str(" | ");
        }
    }
    result.push_str(" |\n|");
    for _ in 0..col_count {
        result.push_str("------|");
    }
    result.push('\n');

    for row in rows.iter().skip(1) {
        result.push_str("| ");
        for (i, cell) in row.iter().enumerate() {
            result.push_str(cell);
            if i < col_count - 1 {
                result.push_str(" | ");
            }
        }
        result.push_str(" |\n");
    }

    result
}
