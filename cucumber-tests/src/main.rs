use cucumber::{cli, World};
use cucumber_tests::features::world::PdfdeskWorld;

#[tokio::main]
async fn main() {
    PdfdeskWorld::cucumber()
        .with_cli::<()>(cli::Opts::parsed())
        .run_and_exit("features/")
        .await;
}
