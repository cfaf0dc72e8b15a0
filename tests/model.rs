#[cfg(test)]
mod tests {
    use dray::{
        GenericSqlWriter, Model, Query, RowLabeled, SaveMode, SqlWriter, Value,
    };
    use indoc::indoc;
    use rust_decimal::Decimal;
    use time::{PrimitiveDateTime, macros::datetime};
    use uuid::Uuid;

    #[derive(Model, Default, Debug, Clone, PartialEq)]
    struct OrderLine {
        id: i64,
        product: String,
        quantity: u32,
        price: Option<Decimal>,
    }

    #[derive(Model, Default, Debug, Clone, PartialEq)]
    #[dray(table = "audit_log")]
    struct Event {
        id: i64,
        #[dray(name = "happened_at")]
        at: Option<PrimitiveDateTime>,
        r#type: String,
        reference: Option<Uuid>,
        payload: Option<Vec<u8>>,
        #[dray(skip)]
        seen: bool,
    }

    #[test]
    fn table_names() {
        assert_eq!(OrderLine::table_name(), "order_line");
        assert_eq!(Event::table_name(), "audit_log");
    }

    #[test]
    fn field_definitions() {
        let fields = OrderLine::fields();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0].name, "id");
        assert!(fields[0].identity);
        assert!(!fields[0].nullable);
        assert_eq!(fields[1].value, Value::Varchar(None));
        assert_eq!(fields[2].value, Value::UInt32(None));
        assert_eq!(fields[3].value, Value::Decimal(None));
        assert!(fields[3].nullable);
        assert!(fields[1..].iter().all(|f| !f.identity));

        assert_eq!(
            Event::field_names().collect::<Vec<_>>(),
            ["id", "happened_at", "type", "reference", "payload"]
        );
        let payload = Event::field("payload").expect("payload should be a field");
        assert_eq!(payload.value, Value::Blob(None));
        assert!(payload.nullable);
        assert!(Event::field("seen").is_none());
        assert!(Event::field("at").is_none());
    }

    #[test]
    fn attributes() {
        let mut line = OrderLine {
            product: "pencil".into(),
            quantity: 3,
            ..Default::default()
        };
        assert!(line.is_transient());
        assert_eq!(
            line.get_attribute("product"),
            Some(Value::Varchar(Some("pencil".into())))
        );
        assert_eq!(line.get_attribute("price"), Some(Value::Decimal(None)));
        assert_eq!(line.get_attribute("unknown"), None);

        assert_eq!(line.set_attribute("quantity", 5u32), Ok(true));
        assert_eq!(line.set_attribute("price", Decimal::new(199, 2)), Ok(true));
        assert_eq!(line.set_attribute("unknown", 1), Ok(false));
        assert_eq!(line.set_attribute("id", 10), Ok(false));
        assert!(line.set_attribute("quantity", -1).is_err());
        assert_eq!(line.quantity, 5);
        assert_eq!(line.price, Some(Decimal::new(199, 2)));
        assert_eq!(line.id, 0);

        let names: Vec<_> = line.get_attributes().into_iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["id", "product", "quantity", "price"]);
    }

    #[test]
    fn fill_from_rows() {
        let row: RowLabeled = [
            ("id", Value::Int64(Some(4))),
            ("happened_at", Value::Varchar(Some("2025-03-01 10:20:30".into()))),
            ("type", Value::Varchar(Some("login".into()))),
            ("reference", Value::Null),
            ("not_a_field", Value::Int32(Some(1))),
        ]
        .into_iter()
        .collect();
        let event = Event::fill(&row)
            .expect("The row should decode")
            .expect("The row is not empty");
        assert_eq!(event.id, 4);
        assert_eq!(event.at, Some(datetime!(2025-03-01 10:20:30)));
        assert_eq!(event.r#type, "login");
        assert_eq!(event.reference, None);
        assert!(!event.seen);

        assert_eq!(Event::fill(&RowLabeled::default()), Ok(None));

        let bad: RowLabeled = [("id", Value::Varchar(Some("four".into())))]
            .into_iter()
            .collect();
        assert!(Event::fill(&bad).is_err());

        let all = OrderLine::fill_all(&[
            [("id", Value::Int64(Some(1))), ("product", "a".into())]
                .into_iter()
                .collect(),
            [("id", Value::Int64(Some(2))), ("product", "b".into())]
                .into_iter()
                .collect(),
        ])
        .expect("The rows should decode");
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].product, "b");
    }

    #[test]
    fn insert_statement() {
        let line = OrderLine {
            product: "pen".into(),
            quantity: 2,
            ..Default::default()
        };
        let values: Vec<_> = line
            .get_attributes()
            .into_iter()
            .filter(|(k, _)| *k != "id")
            .collect();
        let mut query = Query::default();
        GenericSqlWriter::new().write_insert(
            &mut query,
            OrderLine::table_name(),
            &values,
            0,
            SaveMode::InsertOrFail,
        );
        assert_eq!(
            query.sql,
            indoc! {r#"
                INSERT INTO "order_line" ("product", "quantity", "price") VALUES (?, ?, ?)
                RETURNING "id";
            "#}
            .trim()
        );
        assert_eq!(query.bindings.len(), 3);
        assert_eq!(query.bindings[2], Value::Decimal(None));
    }
}
