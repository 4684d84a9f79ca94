pub mod change_log;
pub mod department;
pub mod reference;

use actix_web::web;

use crate::db::store::DepartmentStore;

pub fn routes<S: DepartmentStore + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/v1/department")
            .route(web::post().to(department::create_department::<S>))
            .route(web::get().to(department::get_departments::<S>)),
    )
    .service(
        web::resource("/v1/department/{department_id}")
            .route(web::get().to(department::get_department::<S>))
            .route(web::patch().to(department::update_department::<S>))
            .route(web::delete().to(department::delete_department::<S>)),
    )
    .service(web::resource("/v1/country").route(web::get().to(reference::get_countries::<S>)))
    .service(web::resource("/v1/city").route(web::get().to(reference::get_cities::<S>)))
    .service(
        web::resource("/v1/change-log").route(web::get().to(change_log::get_change_logs::<S>)),
    );
}
