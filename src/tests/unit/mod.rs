//! Behaviour of the validation engine seen through `ValidationSet`

use serde_json::json;

use super::fixtures::{age_and_avatar_set, ajax};
use crate::domain::validation::{
    Declarations, HttpMethod, ParamValue, ParameterOptions, ParameterType, ResolvedValue,
    TypeRegistry, UploadedFile, ValidationSet, DEFAULT_DATETIME_FORMAT,
};
use crate::shared::error::AppError;

fn int(n: i64) -> ResolvedValue {
    ResolvedValue::Scalar(ParamValue::Int(n))
}

fn set_with(name: &str, options: ParameterOptions) -> ValidationSet {
    let mut set = ValidationSet::new(HttpMethod::Get);
    set.add_scalar_parameter(name, &options).unwrap();
    set
}

#[test]
fn cast_after_check_is_idempotent_for_every_kind() {
    let samples = [
        (ParamValue::text("42"), ParameterType::Int),
        (ParamValue::text("hello"), ParameterType::String),
        (ParamValue::text("YES"), ParameterType::Bool),
        (ParamValue::list(["a", "b"]), ParameterType::Array),
        (ParamValue::text("3.14"), ParameterType::Float),
        (ParamValue::text("2024-02-29 13:45:00"), ParameterType::DateTime),
        (ParamValue::list(["1", "2"]), ParameterType::Int),
    ];
    for (value, kind) in samples {
        assert!(TypeRegistry::type_check(&value, kind, DEFAULT_DATETIME_FORMAT), "{:?} {:?}", value, kind);
        let once = TypeRegistry::cast(&value, kind, DEFAULT_DATETIME_FORMAT);
        let twice = TypeRegistry::cast(&once, kind, DEFAULT_DATETIME_FORMAT);
        assert_eq!(once, twice, "{:?}", kind);
    }
}

#[test]
fn bool_words_are_case_insensitive() {
    let format = DEFAULT_DATETIME_FORMAT;
    assert!(TypeRegistry::type_check(&ParamValue::text("YES"), ParameterType::Bool, format));
    assert_eq!(
        TypeRegistry::cast(&ParamValue::text("YES"), ParameterType::Bool, format),
        ParamValue::Bool(true)
    );
    assert!(!TypeRegistry::type_check(&ParamValue::text("maybe"), ParameterType::Bool, format));
}

#[test]
fn float_needs_a_decimal_point() {
    let format = DEFAULT_DATETIME_FORMAT;
    assert!(TypeRegistry::type_check(&ParamValue::text("3.14"), ParameterType::Float, format));
    assert!(!TypeRegistry::type_check(&ParamValue::text("3"), ParameterType::Float, format));
}

#[test]
fn float_sequences_accept_only_float_shaped_elements() {
    let format = DEFAULT_DATETIME_FORMAT;
    assert!(TypeRegistry::type_check(&ParamValue::list(["1.5", "2.25"]), ParameterType::Float, format));
    assert!(!TypeRegistry::type_check(&ParamValue::list(["1.5", "2"]), ParameterType::Float, format));
}

#[test]
fn required_absent_parameter_names_itself() {
    let mut set = set_with("token", ParameterOptions::default());
    let err = set.validate(&ajax("GET")).unwrap_err();
    assert!(err.message.contains("\"token\""));
    assert_eq!(set.last_error(), Some(&err));
}

#[test]
fn optional_absent_parameter_takes_default() {
    let options = ParameterOptions {
        require: Some(false),
        default_value: Some(json!(5)),
        ..ParameterOptions::of_kind(ParameterType::Int)
    };
    let mut set = set_with("limit", options);
    set.validate(&ajax("GET")).unwrap();
    assert_eq!(set.resolved_values().get("limit"), Some(&int(5)));
}

#[test]
fn empty_string_handling() {
    let strict = ParameterOptions::of_kind(ParameterType::Int);
    let mut set = set_with("n", strict);
    let err = set.validate(&ajax("GET").with_scalar("n", "")).unwrap_err();
    assert_eq!(err.message, "The value for parameter \"n\" can not be empty.");

    let lenient = ParameterOptions {
        empty: Some(true),
        default_value: Some(json!(7)),
        ..ParameterOptions::of_kind(ParameterType::Int)
    };
    let mut set = set_with("n", lenient);
    set.validate(&ajax("GET").with_scalar("n", "")).unwrap();
    assert_eq!(set.resolved_values().get("n"), Some(&int(7)));
}

#[test]
fn integer_bounds() {
    let options = ParameterOptions {
        min: Some(json!(1)),
        max: Some(json!(10)),
        ..ParameterOptions::of_kind(ParameterType::Int)
    };
    let mut set = set_with("n", options);

    let err = set.validate(&ajax("GET").with_scalar("n", "15")).unwrap_err();
    assert!(err.message.contains("must be smaller than 10"));

    let mut set = set_with(
        "n",
        ParameterOptions {
            min: Some(json!(1)),
            max: Some(json!(10)),
            ..ParameterOptions::of_kind(ParameterType::Int)
        },
    );
    set.validate(&ajax("GET").with_scalar("n", "5")).unwrap();
    assert_eq!(set.resolved_values().get("n"), Some(&int(5)));
}

#[test]
fn restricted_values_are_an_allow_list() {
    let options = ParameterOptions {
        restricted_value: Some(json!(["a", "b"])),
        ..ParameterOptions::default()
    };
    let set = set_with("letter", options);

    let err = set.evaluate(&ajax("GET").with_scalar("letter", "c")).unwrap_err();
    assert!(err.message.contains("Restricted values are a,b."));

    let values = set.evaluate(&ajax("GET").with_scalar("letter", "a")).unwrap();
    assert_eq!(
        values.get("letter"),
        Some(&ResolvedValue::Scalar(ParamValue::text("a")))
    );
}

#[test]
fn file_size_limit() {
    let set = age_and_avatar_set();
    let shape = |size| {
        ajax("POST")
            .with_scalar("age", "30")
            .with_file("avatar", UploadedFile::new("a.png", "image/png", size))
    };

    let mut small_limit = ValidationSet::new(HttpMethod::Post);
    small_limit
        .add_parameters(&Declarations::from_value(json!({"age": {"type": "int"}})).unwrap())
        .unwrap();
    small_limit
        .add_file_parameters(
            &Declarations::from_value(json!({"avatar": {"maxSize": 1000}})).unwrap(),
        )
        .unwrap();

    let err = small_limit.evaluate(&shape(1500)).unwrap_err();
    assert!(err.message.contains("too big"));
    assert!(small_limit.evaluate(&shape(500)).is_ok());

    assert!(set.evaluate(&shape(1_500_000)).is_ok());
}

#[test]
fn duplicate_names_are_a_configuration_error() {
    let mut set = ValidationSet::new(HttpMethod::Get);
    set.add_scalar_parameter("x", &ParameterOptions::default()).unwrap();
    let err = set
        .add_scalar_parameter("x", &ParameterOptions::of_kind(ParameterType::Int))
        .unwrap_err();
    assert_eq!(err, AppError::DuplicateParameter { name: "x".to_string() });
    assert_eq!(set.scalar_parameters().len(), 1);
    assert_eq!(set.scalar("x").unwrap().kind(), ParameterType::String);
}

#[test]
fn post_with_optional_file_resolves_every_parameter() {
    let mut set = age_and_avatar_set();
    set.validate(&ajax("POST").with_scalar("age", "30")).unwrap();
    assert_eq!(set.resolved_values().to_json(), json!({"age": 30, "avatar": null}));
}

#[test]
fn first_failure_wins() {
    let mut set = ValidationSet::new(HttpMethod::Get);
    set.add_scalar_parameter("first", &ParameterOptions::of_kind(ParameterType::Int))
        .unwrap();
    set.add_scalar_parameter("second", &ParameterOptions::of_kind(ParameterType::Int))
        .unwrap();

    let shape = ajax("GET")
        .with_scalar("first", "one")
        .with_scalar("second", "two");
    let err = set.validate(&shape).unwrap_err();
    assert!(err.message.contains("\"first\""));
    assert!(!err.message.contains("\"second\""));
}

#[test]
fn protocol_is_checked_before_parameters() {
    let mut set = age_and_avatar_set();
    let err = set
        .validate(&crate::domain::validation::RequestShape::new("POST", false))
        .unwrap_err();
    assert_eq!(err.message, "The request is not a Xml Http request.");

    let err = set.validate(&ajax("GET")).unwrap_err();
    assert_eq!(err.message, "Bad request method, must be 'POST'.");
}

#[test]
fn failed_request_leaves_set_reusable() {
    let set = age_and_avatar_set();
    assert!(set.evaluate(&ajax("POST").with_scalar("age", "500")).is_err());
    let values = set.evaluate(&ajax("POST").with_scalar("age", "42")).unwrap();
    assert_eq!(values.to_json()["age"], 42);
}

#[test]
fn sealed_set_rejects_configuration() {
    let mut set = age_and_avatar_set();
    let _ = set.validate(&ajax("POST"));
    assert!(set.is_sealed());
    assert_eq!(
        set.add_scalar_parameter("late", &ParameterOptions::default()).unwrap_err(),
        AppError::Sealed
    );
}
