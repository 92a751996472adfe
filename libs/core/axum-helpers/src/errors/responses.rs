//! Reusable OpenAPI responses for the error envelope.

use super::ErrorResponse;
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToResponse;

#[derive(ToResponse)]
#[response(
    description = "Invalid input, cast failure or duplicate value",
    content_type = "application/json",
    example = json!({
        "status": "fail",
        "message": "Invalid input data. name: A tour must have a name"
    })
)]
pub struct BadRequestResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Missing, invalid or expired credentials",
    content_type = "application/json",
    example = json!({
        "status": "fail",
        "message": "You are not logged in! Please log in to get access."
    })
)]
pub struct UnauthorizedResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Authenticated but the role is not allowed",
    content_type = "application/json",
    example = json!({
        "status": "fail",
        "message": "You do not have permission to perform this action"
    })
)]
pub struct ForbiddenResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "No document with that identifier",
    content_type = "application/json",
    example = json!({
        "status": "fail",
        "message": "No tour found with that ID"
    })
)]
pub struct NotFoundResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Rate limit exceeded",
    content_type = "application/json",
    example = json!({
        "status": "fail",
        "message": "Too many requests from this IP, please try again in an hour!"
    })
)]
pub struct TooManyRequestsResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Internal Server Error",
    content_type = "application/json",
    example = json!({
        "status": "error",
        "message": "Something went very wrong!"
    })
)]
pub struct InternalServerErrorResponse(pub ErrorResponse);
