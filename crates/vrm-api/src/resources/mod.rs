// VRM resource endpoints
//
// Each file adds inherent methods to `VrmClient` for one resource family:
// fetch through the request executor, then hand the body to the matching
// mapper in `crate::mapping`.

mod devices;
mod installation;
mod measurements;
mod sites;
