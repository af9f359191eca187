//! Verifiers that take their expectations from a [`DataTable`].

use super::{TableVerifyOptions, Verifier};
use crate::assertion::fail;
use crate::context::TestContext;
use crate::failure::Result;
use crate::table::DataTable;
use crate::value::Value;

impl Verifier<'_> {
    /// Each table row (formatted and camel-cased) must match some actual entry.
    pub fn verify_set_matches_table(
        &self,
        actual: Option<&Value>,
        table: &DataTable,
        context: &mut TestContext,
        options: &TableVerifyOptions,
    ) -> Result<Value> {
        let actual = require_present(actual, options)?;
        let expected = self
            .formatter()
            .format_and_camel_case(&table.hashes(), context, &options.format)?;

        if options.validate_count
            && let (Some(found), Some(rows)) = (actual.as_array(), expected.as_array())
            && found.len() != rows.len()
        {
            return Err(fail(format!(
                "expected {} records but found {}",
                rows.len(),
                found.len()
            )));
        }

        let mut verify = options.verify.clone();
        if verify.message.is_none() {
            verify.message = options.message.clone();
        }
        self.verify_set_includes(Some(actual), &expected, context, &verify)
    }

    /// The table's first column names fields of `actual` (formatted and
    /// camel-cased like a header row); the second holds their expected values.
    pub fn verify_object_includes_table(
        &self,
        actual: Option<&Value>,
        table: &DataTable,
        context: &TestContext,
        options: &TableVerifyOptions,
    ) -> Result<Value> {
        let actual = require_present(actual, options)?;
        let expected = self
            .formatter()
            .format_and_camel_case(&table.rows_hash(), context, &options.format)?;
        self.verify_object_includes(Some(actual), &expected, context, options.message.as_deref())
    }

    /// No table row may match an actual entry.
    pub fn verify_set_does_not_include_table(
        &self,
        actual: Option<&Value>,
        table: &DataTable,
        context: &TestContext,
        options: &TableVerifyOptions,
    ) -> Result<()> {
        let actual = require_present(actual, options)?;
        let expected = self
            .formatter()
            .format_and_camel_case(&table.hashes(), context, &options.format)?;
        self.verify_set_does_not_include(Some(actual), &expected, context)
    }
}

fn require_present<'a>(
    actual: Option<&'a Value>,
    options: &TableVerifyOptions,
) -> Result<&'a Value> {
    actual.filter(|actual| !actual.is_null()).ok_or_else(|| {
        fail(
            options
                .expected_collection_name
                .clone()
                .unwrap_or_else(|| "No data found!".to_owned()),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failure::Failure;
    use crate::resolve::EntityResolverRegistry;
    use crate::value;

    fn invoices() -> Value {
        value!([
            {"invoiceId": 10, "amount": 1999, "paid": true},
            {"invoiceId": 11, "amount": 500, "paid": false}
        ])
    }

    fn table() -> DataTable {
        DataTable::from_gherkin(
            "
            | Invoice Id | Amount | Paid  |
            | 11         | $5.00  | false |
            ",
        )
        .expect("table")
    }

    #[test]
    fn rows_are_formatted_before_matching() {
        let registry = EntityResolverRegistry::new();
        let verifier = Verifier::new(&registry);
        let mut context = TestContext::new();
        let actual = invoices();

        let options = TableVerifyOptions::default();
        let found = verifier
            .verify_set_matches_table(Some(&actual), &table(), &mut context, &options)
            .expect("invoice 11");
        assert_eq!(found, value!([{"invoiceId": 11, "amount": 500, "paid": false}]));
    }

    #[test]
    fn count_and_missing_collections_are_reported() {
        let registry = EntityResolverRegistry::new();
        let verifier = Verifier::new(&registry);
        let mut context = TestContext::new();
        let actual = invoices();

        let counted = TableVerifyOptions {
            validate_count: true,
            ..TableVerifyOptions::default()
        };
        let failure = verifier
            .verify_set_matches_table(Some(&actual), &table(), &mut context, &counted)
            .expect_err("one row, two invoices");
        assert!(matches!(
            failure,
            Failure::Validation { message } if message == "expected 1 records but found 2"
        ));

        let named = TableVerifyOptions {
            expected_collection_name: Some("invoices were not loaded".to_owned()),
            ..TableVerifyOptions::default()
        };
        let failure = verifier
            .verify_set_matches_table(None, &table(), &mut context, &named)
            .expect_err("no invoices");
        assert!(matches!(
            failure,
            Failure::Validation { message } if message == "invoices were not loaded"
        ));
    }

    #[test]
    fn object_and_negative_table_checks() {
        let registry = EntityResolverRegistry::new();
        let verifier = Verifier::new(&registry);
        let context = TestContext::new();
        let options = TableVerifyOptions::default();
        let invoice = value!({"invoiceId": 10, "customer": {"name": "Acme"}});

        let vertical = DataTable::from_rows([["invoiceId", "10"], ["customer.name", "/acme/i"]]);
        verifier
            .verify_object_includes_table(Some(&invoice), &vertical, &context, &options)
            .expect("fields match");

        let absent = DataTable::from_rows([["Invoice Id"], ["12"]]);
        verifier
            .verify_set_does_not_include_table(Some(&invoices()), &absent, &context, &options)
            .expect("no invoice 12");
        let present = DataTable::from_rows([["Invoice Id"], ["10"]]);
        assert!(
            verifier
                .verify_set_does_not_include_table(Some(&invoices()), &present, &context, &options)
                .is_err()
        );
    }

    #[test]
    fn vertical_tables_are_formatted_like_header_rows() {
        let registry = EntityResolverRegistry::new();
        let verifier = Verifier::new(&registry);
        let context = TestContext::new();
        let options = TableVerifyOptions::default();
        let invoice = value!({"invoiceId": 10, "amount": 1999, "paid": true});

        let vertical = DataTable::from_gherkin(
            "
            | Invoice Id | 10     |
            | Amount     | $19.99 |
            | Paid       | true   |
            ",
        )
        .expect("table");
        verifier
            .verify_object_includes_table(Some(&invoice), &vertical, &context, &options)
            .expect("formatted fields match");

        let wrong_amount = DataTable::from_rows([["Amount", "$19.98"]]);
        let failure = verifier
            .verify_object_includes_table(Some(&invoice), &wrong_amount, &context, &options)
            .expect_err("amount differs");
        assert!(matches!(
            failure,
            Failure::Validation { message }
                if message == "field \"amount\". Expected 1998 but found: 1999"
        ));
    }
}
