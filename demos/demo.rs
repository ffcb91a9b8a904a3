use std::sync::Arc;

use datastore::*;

fn main() -> Result<()> {
    println!("In-Memory Datastore Demo\n");

    let scheme = Scheme::from_json(
        r#"[
        { "name": "STB", "type": "text", "size": 64, "key": true },
        { "name": "TITLE", "type": "text", "size": 64, "key": true },
        { "name": "DATE", "type": "date", "key": true },
        { "name": "REV", "type": "float" },
        { "name": "VIEW_TIME", "type": "time" }
    ]"#,
    )?;
    let storage = MemoryStorage::new(Arc::new(scheme));
    let mut db = Database::open(storage.clone())?;
    println!("Created database with fields {}", field_names(db.scheme().fields()));

    println!("Inserting data...");
    let views = [
        ["stb1", "the matrix", "2014-04-01", "4.00", "1:30"],
        ["stb1", "unbreakable", "2014-04-03", "6.00", "2:05"],
        ["stb3", "the hobbit", "2014-04-02", "8.00", ""], // view time unknown
        ["stb1", "the matrix", "2014-04-01", "5.00", "1:45"],
    ];
    for cells in views {
        let scheme = Arc::clone(db.scheme());
        let mut row = db.create_row();
        for (field, cell) in scheme.fields().iter().zip(cells) {
            if !cell.is_empty() {
                row.set_value(field.id, field.field_type.parse(cell)?);
            }
        }
        let outcome = db.insert(row)?;
        println!("  {:<12} {:?}", cells[1], outcome);
    }
    println!("{} rows stored\n", db.len());

    let stb1 = expr::parse_filter(db.scheme(), "STB=stb1")?;
    let order_by = expr::parse_field_list(db.scheme(), "REV")?;
    let select = expr::parse_field_list(db.scheme(), "TITLE,REV,VIEW_TIME")?;
    let result = db.query(&select, &Predicate::new(stb1), &order_by);

    println!("Views of stb1 by revenue:");
    println!("{:<12} {:<5} {:<8}", "TITLE", "REV", "VIEW_TIME");
    println!("{}", "-".repeat(27));
    for row in &result {
        let cells: Vec<String> = row
            .values()
            .map(|v| v.map_or_else(|| "NULL".into(), ToString::to_string))
            .collect();
        println!("{:<12} {:<5} {:<8}", cells[0], cells[1], cells[2]);
    }
    println!();

    db.close()?;
    println!("Persisted {} rows:", storage.rows().len());
    for row in storage.rows() {
        println!("  {}", row.join("|"));
    }

    Ok(())
}

fn field_names(fields: &[FieldDescriptor]) -> String {
    let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
    names.join(", ")
}
