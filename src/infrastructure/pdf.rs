use crate::domain::dataset::Dataset;
use crate::domain::error::{AppError, Result};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

const PAGE_WIDTH: i64 = 612;
const PAGE_HEIGHT: i64 = 792;
const MARGIN: i64 = 72;

/// Renders a stored dataset summary as a one-page PDF report.
#[derive(Clone, Default)]
pub struct ReportRenderer;

impl ReportRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Build the report bytes. Reads only the dataset summary; never
    /// touches stored state.
    pub fn render(&self, dataset: &Dataset) -> Result<Vec<u8>> {
        let mut doc = Document::with_version("1.5");

        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let content = self.page_content(dataset)?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        });

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "Resources" => resources_id,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)
            .map_err(|e| AppError::RenderError(format!("Failed to write PDF: {}", e)))?;

        Ok(bytes)
    }

    fn page_content(&self, dataset: &Dataset) -> Result<Vec<u8>> {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 20.into()]),
            Operation::new("Td", vec![MARGIN.into(), (PAGE_HEIGHT - MARGIN).into()]),
            Operation::new("Tj", vec![Object::string_literal("Equipment Report")]),
            Operation::new("ET", vec![]),
        ];

        let mut lines = vec![
            format!("Dataset: {}", dataset.filename),
            format!("Uploaded: {}", dataset.upload_date.format("%Y-%m-%d %H:%M:%S UTC")),
            String::new(),
            format!("Total Equipment: {}", dataset.total_count),
            format!("Avg Flowrate: {:.2}", dataset.averages.flowrate),
            format!("Avg Pressure: {:.2}", dataset.averages.pressure),
            format!("Avg Temperature: {:.2}", dataset.averages.temperature),
            String::new(),
            "Type Distribution:".to_string(),
        ];
        for (label, count) in &dataset.type_distribution {
            lines.push(format!("  {}: {}", label, count));
        }

        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("Tf", vec!["F1".into(), 11.into()]));
        operations.push(Operation::new("TL", vec![16.into()]));
        operations.push(Operation::new(
            "Td",
            vec![MARGIN.into(), (PAGE_HEIGHT - MARGIN - 40).into()],
        ));
        for line in &lines {
            operations.push(Operation::new("Tj", vec![Object::string_literal(line.as_str())]));
            operations.push(Operation::new("T*", vec![]));
        }
        operations.push(Operation::new("ET", vec![]));

        Content { operations }
            .encode()
            .map_err(|e| AppError::RenderError(format!("Failed to encode page content: {}", e)))
    }
}
