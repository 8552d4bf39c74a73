use equipoker::api::server::Server;

#[actix_web::main]
async fn main() -> Result<(), std::io::Error> {
    equipoker::log();
    Server::run().await
}
