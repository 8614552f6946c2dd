use indoc::indoc;
use std::fs;
use tempfile::TempDir;
use tsrgen::{normalize, read_records, Error, RawValue, TestResult};

#[test]
fn csv_file_with_aliases_normalizes() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("runs.csv");
    fs::write(
        &path,
        indoc! {"
            tcid,module,status,bug_id,severity,run
            TC1,Login,passed,,,1
            TC1,Login,FAILED,BUG-3,maj,2
            TC2,Cart,blocked
        "},
    )
    .unwrap();

    let raw = read_records(&path).unwrap();
    assert_eq!(raw.len(), 3);
    assert_eq!(raw.rows()[0].get("bug_id"), Some(&RawValue::Empty));

    let table = normalize(&raw);
    let results: Vec<TestResult> = table.iter().map(|r| r.result).collect();
    assert_eq!(
        results,
        vec![TestResult::Pass, TestResult::Fail, TestResult::Blocked]
    );
    assert_eq!(table.records()[1].run, 2);
    assert_eq!(table.records()[1].bug_id, "BUG-3");
    assert_eq!(table.records()[2].run, 1);
}

#[test]
fn json_file_with_records_wrapper() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("runs.json");
    fs::write(
        &path,
        r#"{"records": [{"TestCaseID": "TC9", "Module": "Search", "Result": "Skipped", "Run": 3}]}"#,
    )
    .unwrap();

    let table = normalize(&read_records(&path).unwrap());
    let record = &table.records()[0];
    assert_eq!(record.result, TestResult::Skipped);
    assert_eq!(record.run, 3);
}

#[test]
fn header_only_csv_keeps_columns() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("empty.csv");
    fs::write(&path, "Module,TestCaseID,Result\n").unwrap();

    let raw = read_records(&path).unwrap();
    assert!(raw.is_empty());
    assert_eq!(raw.columns().len(), 3);
}

#[test]
fn testng_xml_file_normalizes() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("testng-results.xml");
    fs::write(
        &path,
        indoc! {r#"
            <?xml version="1.0" encoding="UTF-8"?>
            <testng-results>
              <suite name="Nightly">
                <test-method name="checkoutTotal" class="com.shop.cart.CartTest" status="FAIL" duration-ms="88">
                  <params>
                    <param name="bug_id" value="BUG-12"/>
                    <param name="Severity" value="Critical"/>
                    <param name="Priority" value="High"/>
                  </params>
                </test-method>
                <test-method name="search" class="com.shop.SearchTest" status="SKIP"/>
              </suite>
            </testng-results>
        "#},
    )
    .unwrap();

    let table = normalize(&read_records(&path).unwrap());
    let records: Vec<_> = table.iter().collect();
    assert_eq!(records.len(), 2);

    assert_eq!(records[0].module, "CartTest");
    assert_eq!(records[0].test_case_id, "checkoutTotal");
    assert_eq!(records[0].result, TestResult::Fail);
    assert_eq!(records[0].bug_id, "BUG-12");
    assert_eq!(records[0].tester, "TestNG");
    assert_eq!(records[0].run, 1);

    assert_eq!(records[1].module, "SearchTest");
    assert_eq!(records[1].result, TestResult::Skipped);
    assert!(records[1].bug_id.is_empty());
}

#[test]
fn structural_failures() {
    let temp = TempDir::new().unwrap();

    let missing = read_records(&temp.path().join("nope.csv")).unwrap_err();
    assert!(matches!(missing, Error::FileSystem { .. }));

    let text = temp.path().join("runs.txt");
    fs::write(&text, "TC1 pass").unwrap();
    assert!(matches!(
        read_records(&text).unwrap_err(),
        Error::UnsupportedFormat(_)
    ));

    let xlsx = temp.path().join("runs.xlsx");
    fs::write(&xlsx, [0u8, 1, 2]).unwrap();
    assert!(matches!(
        read_records(&xlsx).unwrap_err(),
        Error::InputParse { .. }
    ));

    let broken = temp.path().join("broken.json");
    fs::write(&broken, "[{\"Module\": ").unwrap();
    assert!(matches!(
        read_records(&broken).unwrap_err(),
        Error::InputParse { .. }
    ));
}
