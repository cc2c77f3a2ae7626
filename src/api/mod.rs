use rocket::Route;

mod auth;
mod choices;
mod common;
mod polls;
mod results;
mod users;
mod votes;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(auth::routes());
    routes.extend(polls::routes());
    routes.extend(choices::routes());
    routes.extend(votes::routes());
    routes.extend(results::routes());
    routes.extend(users::routes());
    routes
}
