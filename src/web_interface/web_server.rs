use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;

use log::{info, warn};
use warp::reply::Response;
use warp::{Filter, Rejection};

use super::routes::*;
use crate::employees::EmployeeService;
use crate::error_handling::types::WebError;
use crate::records::RecordService;

/// JSON API over the record and employee services
pub struct WebServer {
    records: Arc<RecordService>,
    employees: Arc<EmployeeService>,
}

impl WebServer {
    pub fn new(records: Arc<RecordService>, employees: Arc<EmployeeService>) -> Self {
        Self { records, employees }
    }

    /// Every route, with rejections rendered as `ApiError` payloads.
    pub fn routes(&self) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
        let records = index_route()
            .or(assets_route())
            .unify()
            .or(record_options_route(self.records.clone()))
            .unify()
            .or(list_records_route(self.records.clone()))
            .unify()
            .or(record_details_route(self.records.clone()))
            .unify()
            .or(create_record_route(self.records.clone()))
            .unify()
            .or(edit_record_route(self.records.clone()))
            .unify()
            .or(delete_record_route(self.records.clone()))
            .unify()
            .or(bulk_edit_route(self.records.clone()))
            .unify();

        let employees = list_employees_route(self.employees.clone())
            .or(employee_details_route(self.employees.clone()))
            .unify()
            .or(create_employee_route(self.employees.clone()))
            .unify()
            .or(edit_employee_route(self.employees.clone()))
            .unify()
            .or(delete_employee_route(self.employees.clone()))
            .unify()
            .or(roles_route(self.employees.clone()))
            .unify();

        records.or(employees).unify()
    }

    /// Serve on `bind` ("host:port") until ctrl-c.
    pub async fn start(&self, bind: &str) -> Result<(), WebError> {
        let addr: SocketAddr = bind
            .parse()
            .map_err(|e| WebError::BindFailed(format!("{}: {}", bind, e)))?;
        // warp panics on a failed bind, so probe the port first
        TcpListener::bind(addr).map_err(|e| WebError::BindFailed(format!("{}: {}", addr, e)))?;

        let routes = self.routes().recover(handle_rejection);

        info!("Web interface listening on http://{}", addr);
        tokio::select! {
            _ = warp::serve(routes).run(addr) => {
                warn!("Web server stopped unexpectedly");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested, stopping web server");
            }
        }
        Ok(())
    }
}
