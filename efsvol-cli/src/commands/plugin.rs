use efsvol::VolumeDriver;

pub fn execute_capabilities(driver: &VolumeDriver) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(&driver.capabilities())?);
    Ok(())
}

pub fn execute_activate(driver: &VolumeDriver) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(&driver.activate())?);
    Ok(())
}
