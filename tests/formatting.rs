use chrono::{TimeZone, Utc};
use tablematch::coerce::coerce_value;
use tablematch::value::Value;
use tablematch::{
    EntityResolverRegistry, FormatOptions, Formatter, MatchOptions, TestContext, matches,
};

fn color_context() -> TestContext {
    TestContext::new()
        .with_data("blue", tablematch::value!({"_id": "B", "example": "sky"}))
        .with_data("red", tablematch::value!({"_id": "R", "software": "hat"}))
}

fn color_registry() -> EntityResolverRegistry {
    let mut registry = EntityResolverRegistry::new();
    registry.register(["data", "info"], |name, context, containing| {
        containing
            .child("info")
            .and_then(|info| info.child(name))
            .or_else(|| context.data.get(name))
            .cloned()
    });
    registry
}

#[test]
fn resolves_references_through_containing_object_and_context() {
    let registry = color_registry();
    let row = tablematch::value!({
        "content.0.info": "\"blue\"._id",
        "content.0.data": "\"black\".department",
        "content.0.extra": "[data]\"red\".software",
        "content.1.info": "(blue).example",
        "content.1.data": "(black).tvShow",
        "content.1.extra": "[data](red)._id",
        "info": {"black": {"_id": "000", "department": "ops", "tvShow": "mirror"}}
    });

    let formatted = Formatter::new(&registry)
        .format(&row, Some(&color_context()), &FormatOptions::default())
        .expect("format");

    assert_eq!(
        formatted.child("content"),
        Some(&tablematch::value!([
            {"info": "B", "data": "ops", "extra": "hat"},
            {"info": "sky", "data": "mirror", "extra": "R"}
        ]))
    );
}

#[test]
fn resolves_references_inside_json_arrays() {
    let registry = color_registry();
    let formatted = Formatter::new(&registry)
        .format(
            &tablematch::value!({"data": r#"["[data](blue)._id","[data](red)._id"]"#}),
            Some(&color_context()),
            &FormatOptions::default(),
        )
        .expect("format");
    assert_eq!(formatted, tablematch::value!({"data": ["B", "R"]}));
}

#[test]
fn local_dates_use_the_context_zone() {
    let registry = EntityResolverRegistry::new();
    let formatter = Formatter::new(&registry);
    let row = tablematch::value!({"theDate": "[local] 2017-01-01 10:00"});

    let jerusalem = formatter
        .format(&row, Some(&TestContext::new()), &FormatOptions::default())
        .expect("format");
    assert_eq!(
        jerusalem.child("theDate"),
        Some(&Value::Date(Utc.with_ymd_and_hms(2017, 1, 1, 8, 0, 0).unwrap()))
    );

    let new_york = formatter
        .format(
            &row,
            Some(&TestContext::with_timezone("America/New_York")),
            &FormatOptions::default(),
        )
        .expect("format");
    assert_eq!(
        new_york.child("theDate"),
        Some(&Value::Date(Utc.with_ymd_and_hms(2017, 1, 1, 15, 0, 0).unwrap()))
    );
}

#[test]
fn substitutes_references_inside_regex_text() {
    let mut registry = EntityResolverRegistry::new();
    registry.register(["colors"], |name, context, _containing| {
        context.data.get("colors").and_then(|colors| colors.child(name)).cloned()
    });
    let context =
        TestContext::new().with_data("colors", tablematch::value!({"B": {"color": "blue"}}));

    let formatted = Formatter::new(&registry)
        .format(
            &tablematch::value!({"data": "/^hello [colors](B).color world$/"}),
            Some(&context),
            &FormatOptions::default(),
        )
        .expect("format");
    assert_eq!(formatted, tablematch::value!({"data": "/^hello blue world$/"}));

    let actual = tablematch::value!({"data": "hello blue world"});
    assert!(matches(&actual, &formatted, &context, MatchOptions::default()));
}

#[test]
fn resolves_quoted_entities_by_field_key() {
    let mut registry = EntityResolverRegistry::new();
    registry.register(["data"], |name, _context, _containing| {
        (name == "blue").then(|| tablematch::value!({"_id": "B"}))
    });
    let formatted = Formatter::new(&registry)
        .format(
            &tablematch::value!({"data": "\"blue\"._id"}),
            Some(&TestContext::new()),
            &FormatOptions::default(),
        )
        .expect("format");
    assert_eq!(formatted, tablematch::value!({"data": "B"}));
}

#[test]
fn currency_respects_the_cents_switch() {
    let cents = coerce_value(&Value::from("$12.34"), &FormatOptions::default()).expect("coerce");
    assert_eq!(cents, Some(Value::Number(1234.0)));

    let dollars = FormatOptions {
        currency_to_cents: false,
        ..FormatOptions::default()
    };
    assert_eq!(
        coerce_value(&Value::from("$12.34"), &dollars).expect("coerce"),
        Some(Value::Number(12.34))
    );
}

#[test]
fn formatting_twice_is_stable() {
    let registry = EntityResolverRegistry::new();
    let formatter = Formatter::new(&registry);
    let context = TestContext::new();
    let rows = tablematch::value!([
        {
            "Order Id": "17",
            "Total": "$3.50",
            "Shipped": "false",
            "Notes": "-",
            "Placed At": "2021-03-04T05:06:07Z"
        },
        {
            "Order Id": "18",
            "Total": "$0.99",
            "Shipped": "true",
            "Notes": "fragile",
            "Placed At": "2021-03-05"
        }
    ]);

    let once = formatter
        .format_and_camel_case(&rows, &context, &FormatOptions::default())
        .expect("first pass");
    let twice = formatter
        .format_and_camel_case(&once, &context, &FormatOptions::default())
        .expect("second pass");
    assert_eq!(once, twice);
    assert_eq!(
        once.as_array().and_then(|rows| rows[0].child("total")),
        Some(&Value::Number(350.0))
    );
}

#[test]
fn quoted_literals_are_unwrapped_only_once() {
    let registry = EntityResolverRegistry::new();
    let formatter = Formatter::new(&registry);
    let context = TestContext::new();
    let row = tablematch::value!({"Code": "\"007\""});

    let once = formatter
        .format_and_camel_case(&row, &context, &FormatOptions::default())
        .expect("first pass");
    assert_eq!(once, tablematch::value!({"code": "007"}));

    let twice = formatter
        .format_and_camel_case(&once, &context, &FormatOptions::default())
        .expect("second pass");
    assert_eq!(twice, tablematch::value!({"code": 7}));
}

#[test]
fn headless_rows_merge_into_their_head() {
    let registry = EntityResolverRegistry::new();
    let options = FormatOptions {
        merge_headless: true,
        ..FormatOptions::default()
    };
    let formatted = Formatter::new(&registry)
        .format(
            &tablematch::value!([{"h": "A", "v": 1}, {"h": "", "v": 2}, {"h": "B", "v": 3}]),
            None,
            &options,
        )
        .expect("format");
    assert_eq!(formatted, tablematch::value!([{"h": "A", "v": [1, 2]}, {"h": "B", "v": 3}]));
}

#[test]
fn missing_resolvers_are_reported() {
    let registry = EntityResolverRegistry::new();
    let failure = Formatter::new(&registry)
        .format(
            &tablematch::value!({"owner": "[people](dana).name"}),
            Some(&TestContext::new()),
            &FormatOptions::default(),
        )
        .expect_err("no people resolver");
    assert!(matches!(failure, tablematch::Failure::MissingResolver { ref key } if key == "people"));
}

#[test]
fn expression_errors_abort_formatting() {
    let registry = EntityResolverRegistry::new();
    let failure = Formatter::new(&registry)
        .format(
            &tablematch::value!({"total": "{{missing.amount}}"}),
            Some(&TestContext::new()),
            &FormatOptions::default(),
        )
        .expect_err("member access on undefined");
    assert!(matches!(failure, tablematch::Failure::Expression { .. }));
}
