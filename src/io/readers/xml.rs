use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::Path;

use crate::core::{Error, RawRecordSet, RawRow, Result};

const TEST_METHOD: &[u8] = b"test-method";
const PARAM: &[u8] = b"param";

/// One `<test-method>` being collected.
struct MethodRow {
    test_case_id: String,
    description: String,
    result: String,
    duration: String,
    module: String,
    tester: String,
    bug_id: String,
    priority: String,
    severity: String,
}

impl MethodRow {
    fn from_element(element: &BytesStart<'_>, source: &Path) -> Result<Self> {
        let mut row = MethodRow {
            test_case_id: String::new(),
            description: String::new(),
            result: "Not Executed".to_string(),
            duration: "0".to_string(),
            module: String::new(),
            tester: "TestNG".to_string(),
            bug_id: String::new(),
            priority: String::new(),
            severity: String::new(),
        };
        for (key, value) in attributes(element, source)? {
            match key.as_str() {
                "name" => row.test_case_id = value,
                "description" => row.description = value,
                "status" => row.result = value,
                "duration-ms" => row.duration = value,
                // com.example.LoginTest -> LoginTest
                "class" => {
                    row.module = value.rsplit('.').next().unwrap_or_default().to_string()
                }
                _ => {}
            }
        }
        Ok(row)
    }

    /// Apply a `<param name=".." value=".."/>` inside the method.
    fn apply_param(&mut self, element: &BytesStart<'_>, source: &Path) -> Result<()> {
        let attrs = attributes(element, source)?;
        let get = |key: &str| {
            attrs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
                .unwrap_or_default()
        };
        let value = get("value");
        match get("name").to_lowercase().as_str() {
            "module" | "class" => self.module = value,
            "tester" | "executed_by" => self.tester = value,
            "bugid" | "bug_id" => self.bug_id = value,
            "priority" => self.priority = value,
            "severity" => self.severity = value,
            _ => {}
        }
        Ok(())
    }

    fn into_row(self) -> RawRow {
        RawRow::new()
            .with("TestCaseID", self.test_case_id)
            .with("Description", self.description)
            .with("Result", self.result)
            .with("Duration", self.duration)
            .with("Module", self.module)
            .with("Run", "1")
            .with("Tester", self.tester)
            .with("BugID", self.bug_id)
            .with("Priority", self.priority)
            .with("Severity", self.severity)
    }
}

fn attributes(element: &BytesStart<'_>, source: &Path) -> Result<Vec<(String, String)>> {
    element
        .attributes()
        .map(|attr| {
            let attr = attr.map_err(|e| Error::input_parse(source, e.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| Error::input_parse(source, e.to_string()))?
                .into_owned();
            Ok((key, value))
        })
        .collect()
}

/// Parse a TestNG results document. Every `<test-method>` anywhere in the
/// tree becomes one row; its attributes and nested `<param>` elements fill
/// the canonical columns.
pub fn parse_testng_xml(text: &str, source: &Path) -> Result<RawRecordSet> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut set = RawRecordSet::default();
    let mut current: Option<MethodRow> = None;
    let mut saw_root = false;

    loop {
        let event = reader.read_event().map_err(|e| {
            Error::input_parse(
                source,
                format!("invalid XML at byte {}: {e}", reader.buffer_position()),
            )
        })?;
        match event {
            Event::Start(element) => {
                saw_root = true;
                match element.name().as_ref() {
                    TEST_METHOD => current = Some(MethodRow::from_element(&element, source)?),
                    PARAM => {
                        if let Some(row) = current.as_mut() {
                            row.apply_param(&element, source)?;
                        }
                    }
                    _ => {}
                }
            }
            Event::Empty(element) => {
                saw_root = true;
                match element.name().as_ref() {
                    TEST_METHOD => {
                        set.push_row(MethodRow::from_element(&element, source)?.into_row())
                    }
                    PARAM => {
                        if let Some(row) = current.as_mut() {
                            row.apply_param(&element, source)?;
                        }
                    }
                    _ => {}
                }
            }
            Event::End(element) if element.name().as_ref() == TEST_METHOD => {
                if let Some(row) = current.take() {
                    set.push_row(row.into_row());
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(Error::input_parse(source, "document has no root element"));
    }
    Ok(set)
}
