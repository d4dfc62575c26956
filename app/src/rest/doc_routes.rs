use utoipa::openapi::path::{OperationBuilder, PathItem, PathItemType, PathsBuilder};
use utoipa::openapi::request_body::RequestBodyBuilder;
use utoipa::openapi::schema::ComponentsBuilder;
use utoipa::openapi::tag::TagBuilder;
use utoipa::openapi::{
    ContentBuilder, InfoBuilder, OpenApi, OpenApiBuilder, Ref, ResponseBuilder,
};
use utoipa::IntoParams;
use warp::Filter;

use super::dto::ErrorResponseDto;
use super::measurement_routes::dto::{MeasurementDto, PlotPath};
use super::metric_routes::dto::HealthyDto;
use super::query::DateQuery;
use super::webhook_routes::dto::{EventQuery, IgnoredEventDto, IngestSuccessDto};

pub fn routes() -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let api = api_doc();
    warp::path!("api" / "doc" / "api.json")
        .and(warp::get())
        .map(move || warp::reply::json(&api))
        .boxed()
}

fn json_response(description: &str, schema: &str) -> utoipa::openapi::Response {
    ResponseBuilder::new()
        .description(description)
        .content(
            "application/json",
            ContentBuilder::new()
                .schema(Ref::from_schema_name(schema))
                .build(),
        )
        .build()
}

fn error_response(description: &str) -> utoipa::openapi::Response {
    json_response(description, "ErrorResponseDto")
}

pub fn api_doc() -> OpenApi {
    let ingest = OperationBuilder::new()
        .tag("ingest")
        .summary(Some("Ingest one network-server webhook delivery"))
        .parameters(Some(EventQuery::into_params(|| None)))
        .request_body(Some(
            RequestBodyBuilder::new()
                .description(Some("Provider shaped uplink envelope"))
                .content("application/json", ContentBuilder::new().build())
                .build(),
        ))
        .response(
            "200",
            json_response(
                "Uplink stored or event ignored, see IgnoredEventDto",
                "IngestSuccessDto",
            ),
        )
        .response("400", error_response("Malformed envelope or no plot assignment"))
        .response("404", error_response("Unregistered device"))
        .response("413", error_response("Payload too large"))
        .response("500", error_response("Storage failure"))
        .build();

    let mut window_params = PlotPath::into_params(|| None);
    window_params.extend(DateQuery::into_params(|| None));
    let measurements = OperationBuilder::new()
        .tag("measurements")
        .summary(Some("Measurements of a plot in a window of at most 31 days"))
        .parameters(Some(window_params))
        .response("200", json_response("Measurements, newest first", "MeasurementDto"))
        .response("400", error_response("Invalid window"))
        .response("404", error_response("Unknown plot"))
        .build();

    let latest = OperationBuilder::new()
        .tag("measurements")
        .summary(Some("Measurements of a plot during the last 24 hours"))
        .parameters(Some(PlotPath::into_params(|| None)))
        .response("200", json_response("Measurements, newest first", "MeasurementDto"))
        .response("404", error_response("Unknown plot"))
        .build();

    let health = OperationBuilder::new()
        .tag("metrics")
        .summary(Some("Service and database health"))
        .response("200", json_response("Health report", "HealthyDto"))
        .build();

    let paths = PathsBuilder::new()
        .path("/webhooks/ingest", PathItem::new(PathItemType::Post, ingest))
        .path(
            "/api/plots/{plot_id}/measurements",
            PathItem::new(PathItemType::Get, measurements),
        )
        .path(
            "/api/plots/{plot_id}/measurements/latest",
            PathItem::new(PathItemType::Get, latest),
        )
        .path("/api/health", PathItem::new(PathItemType::Get, health))
        .build();

    let components = ComponentsBuilder::new()
        .schema_from::<ErrorResponseDto>()
        .schema_from::<IngestSuccessDto>()
        .schema_from::<IgnoredEventDto>()
        .schema_from::<MeasurementDto>()
        .schema_from::<HealthyDto>()
        .build();

    let tags = ["ingest", "measurements", "metrics"]
        .into_iter()
        .map(|name| TagBuilder::new().name(name).build())
        .collect::<Vec<_>>();

    OpenApiBuilder::new()
        .info(
            InfoBuilder::new()
                .title("agro")
                .version(env!("CARGO_PKG_VERSION"))
                .build(),
        )
        .paths(paths)
        .components(Some(components))
        .tags(Some(tags))
        .build()
}
