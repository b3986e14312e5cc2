//! The map-sharing and user API payloads, declared with shape-pack and pushed through every
//! backend.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shape_pack::*;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct ApiSuccess {
    success: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiError {
    success: bool,
    status_code: u16,
    error_message: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Complexity {
    complexity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    complexity_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Song {
    title: String,
    artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    album_art: Option<String>,
    complexities: Vec<Complexity>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PdMap {
    id: String,
    submission_date: String,
    title: String,
    artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    author: Option<String>,
    uploader: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    album_art: Option<String>,
    complexities: Vec<Complexity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct GetMapSuccess {
    success: bool,
    map: PdMap,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
enum GetMapResponse {
    Success(GetMapSuccess),
    Error(ApiError),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitMapRequest {
    #[serde(with = "serde_bytes")]
    map_data: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct SubmitMapSuccess {
    success: bool,
    id: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
enum SubmitMapResponse {
    Success(SubmitMapSuccess),
    Error(ApiError),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct User {
    id: String,
    username: String,
    email: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct SignupError {
    success: bool,
    #[serde(rename = "statusCode")]
    status_code: u16,
    #[serde(rename = "errorMessage")]
    error_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    password: Option<String>,
}

// ApiSuccess ignores unknown keys, so it has to be tried last
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
enum SignupResponse {
    Error(SignupError),
    Success(ApiSuccess),
}

struct Contracts {
    api_success: Record<ApiSuccess>,
    api_error: Record<ApiError>,
    song: Record<Song>,
    map: Record<PdMap>,
    get_map_response: Descriptor<GetMapResponse>,
    submit_map_request: Record<SubmitMapRequest>,
    submit_map_response: Descriptor<SubmitMapResponse>,
    user: Record<User>,
    signup_response: Descriptor<SignupResponse>,
}

fn contracts() -> Contracts {
    let api_success = record::<ApiSuccess>(
        "apiSuccess",
        Fields::new().add("success", &literal_bool("success", true)),
    );
    let api_error = record::<ApiError>(
        "apiError",
        Fields::new()
            .add("success", &literal_bool("success", false))
            .add("statusCode", &number("statusCode"))
            .add("errorMessage", &string("errorMessage")),
    );

    let complexity = record::<Complexity>(
        "complexity",
        Fields::new()
            .add("complexity", &number("complexity"))
            .add("complexityName", &optional(&string("complexityName"))),
    );
    let complexities = list("complexities", &complexity);

    let song = record::<Song>(
        "song",
        Fields::new()
            .add("title", &string("title"))
            .add("artist", &string("artist"))
            .add("albumArt", &optional(&string("albumArt")))
            .add("complexities", &complexities),
    );

    let map = record::<PdMap>(
        "map",
        Fields::new()
            .add("id", &string("id"))
            .add("submissionDate", &string("submissionDate"))
            .add("title", &string("title"))
            .add("artist", &string("artist"))
            .add("author", &optional(&string("author")))
            .add("uploader", &string("uploader"))
            .add("albumArt", &optional(&string("albumArt")))
            .add("complexities", &complexities)
            .add("description", &optional(&string("description"))),
    );

    let get_map_success = ExtendBuilder::new("getMapSuccess", &api_success)
        .field("map", &map)
        .build::<GetMapSuccess>();
    let get_map_response = union(
        "getMapResponse",
        "success",
        vec![get_map_success.variant(), api_error.variant()],
    );

    let submit_map_request = record::<SubmitMapRequest>(
        "submitMapRequest",
        Fields::new().add("mapData", &bytes("mapData")),
    );
    let submit_map_success = ExtendBuilder::new("submitMapSuccess", &api_success)
        .field("id", &string("id"))
        .build::<SubmitMapSuccess>();
    let submit_map_error = extend::<ApiError, _>("submitMapError", &api_error, Fields::new());
    let submit_map_response = UnionBuilder::new("submitMapResponse", "success")
        .variant(&submit_map_success)
        .variant(&submit_map_error)
        .build();

    let user = RecordBuilder::new("user")
        .field("id", &string("id"))
        .field("username", &string("username"))
        .field("email", &string("email"))
        .build::<User>();

    let signup_error = extend::<SignupError, _>(
        "signupError",
        &api_error,
        Fields::new()
            .add("username", &optional(&string("username")))
            .add("email", &optional(&string("email")))
            .add("password", &optional(&string("password"))),
    );
    let signup_response = union(
        "signupResponse",
        "success",
        vec![api_success.variant(), signup_error.variant()],
    );

    Contracts {
        api_success,
        api_error,
        song,
        map,
        get_map_response,
        submit_map_request,
        submit_map_response,
        user,
        signup_response,
    }
}

fn all_star() -> Song {
    Song {
        title: "All Star".into(),
        artist: "Smash Mouth".into(),
        album_art: None,
        complexities: vec![Complexity {
            complexity: 1,
            complexity_name: Some("Easy".into()),
        }],
    }
}

fn pd_map() -> PdMap {
    PdMap {
        id: "1".into(),
        submission_date: "2021-06-01T00:00:00".into(),
        title: "All Star".into(),
        artist: "Smash Mouth".into(),
        author: Some("Alice".into()),
        uploader: "Alice".into(),
        album_art: None,
        complexities: vec![
            Complexity {
                complexity: 1,
                complexity_name: Some("Easy".into()),
            },
            Complexity {
                complexity: 5,
                complexity_name: Some("Hard".into()),
            },
        ],
        description: Some("Best song ever".into()),
    }
}

fn object(pairs: Vec<(&str, Value)>) -> Value {
    Value::Map(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
}

#[test]
fn all_star_text_is_key_ordered() {
    let c = contracts();
    let text = c.song.serialize(&TextBackend::new(), &all_star()).unwrap();
    assert_eq!(
        text,
        r#"{"artist":"Smash Mouth","complexities":[{"complexity":1,"complexityName":"Easy"}],"title":"All Star"}"#
    );
    assert!(!text.contains("albumArt"));
    let song = c.song.deserialize(&TextBackend::new(), text.as_str()).unwrap();
    assert_eq!(song, all_star());
    assert_eq!(song.album_art, None);
}

#[test]
fn map_round_trips_through_every_backend() {
    let c = contracts();
    let map = pd_map();

    let text = c.map.serialize(&TextBackend::new(), &map).unwrap();
    assert_eq!(c.map.deserialize(&TextBackend::new(), text.as_str()).unwrap(), map);

    let pretty = TextBackend::new().pretty(true);
    let text = c.map.serialize(&pretty, &map).unwrap();
    assert!(text.contains('\n'));
    assert_eq!(c.map.deserialize(&pretty, text.as_str()).unwrap(), map);

    let packed = c.map.serialize(&CompactBackend::new(), &map).unwrap();
    assert_eq!(c.map.deserialize(&CompactBackend::new(), packed.as_slice()).unwrap(), map);

    let codec = MarkerCodec::new();
    let document = DocumentBackend::new(&codec);
    let packed = c.map.serialize(&document, &map).unwrap();
    assert_eq!(c.map.deserialize(&document, packed.as_slice()).unwrap(), map);

    for format in [Format::Text, Format::Compact, Format::Document] {
        let packed = c.map.serialize(&format, &map).unwrap();
        assert_eq!(c.map.deserialize(&format, packed.as_slice()).unwrap(), map, "{:?}", format);
    }
}

#[test]
fn document_encoding_is_canonical() {
    let c = contracts();
    let codec = MarkerCodec::new();
    let document = DocumentBackend::new(&codec);
    let first = c.map.serialize(&document, &pd_map()).unwrap();
    let second = c.map.serialize(&document, &pd_map()).unwrap();
    assert_eq!(first, second);
    let mut tampered = first.clone();
    tampered.push(0xc0);
    assert!(matches!(
        c.map.deserialize(&document, tampered.as_slice()),
        Err(Error::BadDecode(_))
    ));
}

#[test]
fn map_data_stays_binary() {
    let c = contracts();
    let request = SubmitMapRequest {
        map_data: vec![0, 159, 146, 150, 255],
    };
    let text = c
        .submit_map_request
        .serialize(&TextBackend::new(), &request)
        .unwrap();
    assert_eq!(text, r#"{"mapData":{"$bin":"AJ+Slv8="}}"#);
    assert_eq!(
        c.submit_map_request
            .deserialize(&TextBackend::new(), text.as_str())
            .unwrap(),
        request
    );

    let codec = MarkerCodec::new();
    let packed = c
        .submit_map_request
        .serialize(&DocumentBackend::new(&codec), &request)
        .unwrap();
    assert_eq!(
        c.submit_map_request
            .deserialize(&DocumentBackend::new(&codec), packed.as_slice())
            .unwrap(),
        request
    );

    let err = c
        .submit_map_request
        .validate_value(object(vec![("mapData", Value::from("not bytes"))]))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        r#"Expected mapData to be bytes but found type string instead, with value "not bytes""#
    );
}

#[test]
fn get_map_response_picks_variant() {
    let c = contracts();
    let success = GetMapResponse::Success(GetMapSuccess {
        success: true,
        map: pd_map(),
    });
    let text = c.get_map_response.serialize(&TextBackend::new(), &success).unwrap();
    assert_eq!(
        c.get_map_response
            .deserialize(&TextBackend::new(), text.as_str())
            .unwrap(),
        success
    );

    let failure = GetMapResponse::Error(ApiError {
        success: false,
        status_code: 404,
        error_message: "Map not found".into(),
    });
    let packed = c
        .get_map_response
        .serialize(&CompactBackend::new(), &failure)
        .unwrap();
    assert_eq!(
        c.get_map_response
            .deserialize(&CompactBackend::new(), packed.as_slice())
            .unwrap(),
        failure
    );
}

#[test]
fn union_mismatch_names_the_union() {
    let c = contracts();
    // A success flag with an error body matches neither variant
    let text = r#"{"errorMessage":"Map not found","statusCode":404,"success":true}"#;
    let err = c
        .get_map_response
        .deserialize(&TextBackend::new(), text)
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(err.descriptor_name(), Some("getMapResponse"));
    assert_eq!(
        err.to_string(),
        format!(
            "Expected getMapResponse to be union but found type object instead, with value {}",
            text
        )
    );
}

#[test]
fn nested_failures_name_the_field() {
    let c = contracts();
    let mut map = pd_map();
    map.complexities[1].complexity_name = None;
    assert_eq!(c.map.validate(&map).unwrap(), map);

    let mut value = to_value(&pd_map()).unwrap();
    value.as_map_mut().unwrap().insert("uploader".into(), Value::from(7));
    let err = c.map.validate_value(value).unwrap_err();
    assert_eq!(
        err,
        Error::TypeMismatch {
            name: "uploader".into(),
            expected: "string".into(),
            actual: "number",
            value: "7".into(),
        }
    );
}

#[test]
fn missing_required_field_reads_as_null() {
    let c = contracts();
    let err = c
        .user
        .validate_value(object(vec![
            ("id", Value::from("u1")),
            ("username", Value::from("alice")),
        ]))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Expected email to be string but found type null instead, with value null"
    );
}

#[test]
fn undeclared_keys_are_preserved() {
    let c = contracts();
    let value = object(vec![
        ("id", Value::from("u1")),
        ("username", Value::from("alice")),
        ("email", Value::from("alice@example.com")),
        ("lastLogin", Value::from("2021-06-01")),
    ]);
    assert_eq!(c.user.validate_value(value.clone()).unwrap(), value);
    let text = c.user.serialize_value(&TextBackend::new(), value).unwrap();
    assert!(text.contains("lastLogin"));
}

#[test]
fn signup_error_carries_field_messages() {
    let c = contracts();
    let response = SignupResponse::Error(SignupError {
        success: false,
        status_code: 400,
        error_message: "Invalid signup".into(),
        username: Some("Username is taken".into()),
        email: None,
        password: Some("Password is too short".into()),
    });
    let text = c.signup_response.serialize(&TextBackend::new(), &response).unwrap();
    assert!(!text.contains("\"email\""));
    assert_eq!(
        c.signup_response
            .deserialize(&TextBackend::new(), text.as_str())
            .unwrap(),
        response
    );

    let ok = SignupResponse::Success(ApiSuccess { success: true });
    assert_eq!(c.signup_response.validate(&ok).unwrap(), ok);
}

#[test]
fn submit_map_response_both_ways() {
    let c = contracts();
    let ok = SubmitMapResponse::Success(SubmitMapSuccess {
        success: true,
        id: "m1".into(),
    });
    assert_eq!(c.submit_map_response.validate(&ok).unwrap(), ok);
    let err = SubmitMapResponse::Error(ApiError {
        success: false,
        status_code: 413,
        error_message: "Map too large".into(),
    });
    assert_eq!(c.submit_map_response.validate(&err).unwrap(), err);
    let oops = ApiError {
        success: false,
        status_code: 500,
        error_message: "oops".into(),
    };
    assert_eq!(c.api_error.validate(&oops).unwrap().status_code, 500);
}

// An error variant with a free success flag overlaps the success variant whenever the payload
// carries both an id and the error keys. Dropping undeclared keys makes the winner visible.
fn ambiguous_variants(c: &Contracts) -> (Record<()>, Record<()>) {
    let success = ExtendBuilder::new("submitMapSuccess", &c.api_success)
        .field("id", &string("id"))
        .unknown_keys(UnknownKeys::Drop)
        .build();
    let error = ExtendBuilder::new("submitMapError", &c.api_error)
        .field("success", &boolean("success"))
        .field("mapData", &optional(&string("mapData")))
        .field("title", &optional(&string("title")))
        .unknown_keys(UnknownKeys::Drop)
        .build();
    (success, error)
}

fn ambiguous_payload() -> Value {
    object(vec![
        ("success", Value::from(true)),
        ("id", Value::from("m1")),
        ("statusCode", Value::from(422)),
        ("errorMessage", Value::from("Invalid map")),
        ("title", Value::from("Title is too long")),
    ])
}

#[test]
fn ambiguous_submit_response_takes_first_declared() {
    let c = contracts();
    let (success, error) = ambiguous_variants(&c);

    // Both variants accept the payload on their own
    assert!(success.validate_value(ambiguous_payload()).is_ok());
    assert!(error.validate_value(ambiguous_payload()).is_ok());

    let success_first: Descriptor<()> = UnionBuilder::new("submitMapResponse", "success")
        .variant(&success)
        .variant(&error)
        .build();
    assert_eq!(
        success_first.validate_value(ambiguous_payload()).unwrap(),
        object(vec![("success", Value::from(true)), ("id", Value::from("m1"))])
    );

    let error_first: Descriptor<()> = UnionBuilder::new("submitMapResponse", "success")
        .variant(&error)
        .variant(&success)
        .build();
    assert_eq!(
        error_first.validate_value(ambiguous_payload()).unwrap(),
        object(vec![
            ("success", Value::from(true)),
            ("statusCode", Value::from(422)),
            ("errorMessage", Value::from("Invalid map")),
            ("title", Value::from("Title is too long")),
        ])
    );
}

#[test]
fn override_replaces_base_field() {
    let c = contracts();
    let (_, error) = ambiguous_variants(&c);
    // The base's literal false is never consulted for "success"
    let value = object(vec![
        ("success", Value::from(true)),
        ("statusCode", Value::from(500)),
        ("errorMessage", Value::from("oops")),
    ]);
    assert_eq!(error.validate_value(value.clone()).unwrap(), value);
    // But the override still governs it
    let err = error
        .validate_value(object(vec![
            ("success", Value::from("yes")),
            ("statusCode", Value::from(500)),
            ("errorMessage", Value::from("oops")),
        ]))
        .unwrap_err();
    assert_eq!(err.descriptor_name(), Some("success"));
    assert!(matches!(err, Error::TypeMismatch { .. }));
    match error.shape() {
        Shape::Extend(shape) => {
            assert_eq!(shape.overridden_keys().collect::<Vec<_>>(), vec!["success"]);
            assert_eq!(shape.base_name(), "apiError");
        }
        _ => panic!("not an extension"),
    }
}

#[test]
fn list_failure_is_atomic() {
    let c = contracts();
    let mut value = to_value(&all_star()).unwrap();
    let complexities = value.as_map_mut().unwrap().get_mut("complexities").unwrap();
    let items = complexities.as_array_mut().unwrap();
    items.push(object(vec![("complexity", Value::from(2))]));
    items.push(object(vec![("complexity", Value::from("three"))]));
    items.push(object(vec![("complexity", Value::from(4))]));
    let err = c.song.validate_value(value).unwrap_err();
    assert_eq!(
        err.to_string(),
        r#"Expected complexity to be number but found type string instead, with value "three""#
    );
}

#[test]
fn optional_identity() {
    let art = optional(&bounded_string("albumArt", 8));
    let again = optional(&art);
    assert!(std::ptr::eq(art.shape(), again.shape()));
    assert_eq!(art.validate_value(Value::Null).unwrap(), Value::Null);
    assert_eq!(
        art.validate_value(Value::from("cover.png")).unwrap_err(),
        bounded_string("albumArt", 8)
            .validate_value(Value::from("cover.png"))
            .unwrap_err()
    );
}

#[test]
fn concurrent_use() {
    let c = contracts();
    let codec = MarkerCodec::new();
    std::thread::scope(|s| {
        for i in 0..8u32 {
            let c = &c;
            let codec = &codec;
            s.spawn(move || {
                let mut song = all_star();
                song.complexities[0].complexity = i;
                for _ in 0..50 {
                    let backend = DocumentBackend::new(codec);
                    let packed = c.song.serialize(&backend, &song).unwrap();
                    assert_eq!(c.song.deserialize(&backend, packed.as_slice()).unwrap(), song);
                    let text = c.song.serialize(&TextBackend::new(), &song).unwrap();
                    assert_eq!(
                        c.song.deserialize(&TextBackend::new(), text.as_str()).unwrap(),
                        song
                    );
                }
            });
        }
    });
}

#[test]
fn dynamic_values_through_format_config() {
    let c = contracts();
    let formats: BTreeMap<String, Format> =
        serde_json::from_str(r#"{"api":"text","cache":"compact","store":"document"}"#).unwrap();
    let value = to_value(&all_star()).unwrap();
    for (_, format) in formats {
        let packed = c.song.serialize_value(&format, value.clone()).unwrap();
        assert_eq!(c.song.deserialize_value(&format, packed.as_slice()).unwrap(), value);
    }
}
